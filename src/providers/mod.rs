//! Balance data providers.
//!
//! Defines the `BalanceSource` trait and provides the Plaid implementation.
//! The notifier only sees the trait, so tests substitute scripted sources.

pub mod plaid;

use async_trait::async_trait;

use crate::types::{BalanceRecord, ProviderError};

/// Abstraction over account-balance providers.
///
/// One call per scheduled run; implementations hold their own credentials
/// and HTTP client. Failures are typed so the notifier can degrade the
/// message body instead of aborting the run.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fetch current balances for every linked account.
    async fn fetch_balances(&self) -> Result<Vec<BalanceRecord>, ProviderError>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}
