//! The notification pipeline: fetch balances, format the summary, send it.
//!
//! Each run is a linear three-step pipeline with no state carried between
//! runs. Provider failures degrade the run — a fetch error swaps the body
//! for a placeholder, a delivery error or missing credentials is a logged
//! no-op — and the schedule loop always gets a `RunReport` back, never an
//! error.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::messaging::MessageSink;
use crate::providers::BalanceSource;
use crate::types::{BalanceRecord, RunReport};

/// Header line of every summary message.
pub const MESSAGE_HEADER: &str = "Account Balances:";

/// Body sent when the balance fetch fails. Replaces the whole message.
pub const FETCH_FALLBACK: &str = "Unable to fetch account balances";

// ---------------------------------------------------------------------------
// Delivery configuration
// ---------------------------------------------------------------------------

/// Whether the run can actually deliver SMS.
///
/// Resolved once at startup: if any required messaging credential is
/// absent no sink is constructed, and each firing logs the missing
/// variable names instead of sending.
pub enum Delivery {
    Ready(Box<dyn MessageSink>),
    Unconfigured { missing: Vec<String> },
}

// ---------------------------------------------------------------------------
// Message formatting
// ---------------------------------------------------------------------------

/// Build the notification body: the header plus one line per record,
/// newline-joined. Zero records yields just the header.
pub fn format_message(records: &[BalanceRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(MESSAGE_HEADER.to_string());
    for record in records {
        lines.push(record.to_string());
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Orchestrates one fetch→format→send run per trigger firing.
pub struct Notifier {
    source: Box<dyn BalanceSource>,
    delivery: Delivery,
}

impl Notifier {
    pub fn new(source: Box<dyn BalanceSource>, delivery: Delivery) -> Self {
        Self { source, delivery }
    }

    /// Run the pipeline once. Infallible by signature: every failure path
    /// is logged and reflected in the report, and the process keeps
    /// waiting for the next trigger.
    pub async fn run_once(&self) -> RunReport {
        let started = Utc::now();

        let (body, fetched) = match self.source.fetch_balances().await {
            Ok(records) => {
                info!(
                    provider = self.source.name(),
                    accounts = records.len(),
                    "Balances fetched"
                );
                (format_message(&records), Some(records.len()))
            }
            Err(e) => {
                warn!(
                    provider = self.source.name(),
                    error = %e,
                    "Balance fetch failed — sending placeholder body"
                );
                (FETCH_FALLBACK.to_string(), None)
            }
        };

        let receipt = match &self.delivery {
            Delivery::Ready(sink) => match sink.send(&body).await {
                Ok(receipt) => {
                    info!(sink = sink.name(), sid = %receipt.sid, "Summary delivered");
                    Some(receipt)
                }
                Err(e) => {
                    error!(sink = sink.name(), error = %e, "Delivery failed");
                    None
                }
            },
            Delivery::Unconfigured { missing } => {
                error!(
                    missing = ?missing,
                    "Messaging credentials incomplete — skipping send"
                );
                None
            }
        };

        RunReport {
            timestamp: started,
            accounts: fetched.unwrap_or(0),
            degraded: fetched.is_none(),
            delivered: receipt.is_some(),
            delivery_sid: receipt.map(|r| r.sid),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
