//! Message delivery sinks.
//!
//! Defines the `MessageSink` trait and provides the Twilio SMS
//! implementation. The notifier only sees the trait, so tests substitute
//! recording sinks.

pub mod twilio;

use async_trait::async_trait;

use crate::types::{DeliveryError, DeliveryReceipt};

/// Abstraction over outbound message delivery.
///
/// One send per scheduled run; the receipt's sid is used only for logging.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver `body` to the configured recipient.
    async fn send(&self, body: &str) -> Result<DeliveryReceipt, DeliveryError>;

    /// Sink name for logging and identification.
    fn name(&self) -> &str;
}
