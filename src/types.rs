//! Shared types for the TELLER notifier.
//!
//! These types form the data model used across all modules: the per-account
//! balance record produced by the provider, the delivery receipt returned by
//! the messaging sink, and the per-run report logged by the schedule loop.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Balance record
// ---------------------------------------------------------------------------

/// One account's balance as returned by the balance provider.
///
/// Produced fresh on every run and consumed immediately to build the
/// notification body — nothing is persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub name: String,
    /// Current balance in the account's currency.
    pub current: Decimal,
}

impl BalanceRecord {
    pub fn new(name: impl Into<String>, current: Decimal) -> Self {
        Self {
            name: name.into(),
            current,
        }
    }
}

impl fmt::Display for BalanceRecord {
    /// Renders the summary line used in the notification body,
    /// e.g. `Checking: $1,234.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ${}", self.name, format_currency(self.current))
    }
}

/// Format a monetary amount with two decimal places and thousands
/// separators: `1234.5` → `1,234.50`, `-20` → `-20.00`.
pub fn format_currency(amount: Decimal) -> String {
    let raw = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}

// ---------------------------------------------------------------------------
// Delivery receipt
// ---------------------------------------------------------------------------

/// Confirmation returned by the messaging provider after a send.
/// The sid is used only for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub sid: String,
    pub status: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Summary of a single fetch→format→send run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    /// Accounts included in the message body (0 when degraded).
    pub accounts: usize,
    /// Whether the balance fetch failed and the placeholder body was used.
    pub degraded: bool,
    pub delivered: bool,
    pub delivery_sid: Option<String>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run at {}: accounts={} degraded={} delivered={}{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.accounts,
            self.degraded,
            self.delivered,
            self.delivery_sid
                .as_deref()
                .map(|sid| format!(" sid={sid}"))
                .unwrap_or_default(),
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures from the balance provider. The notifier degrades the message
/// body on any of these rather than aborting the run.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Balance request failed: {0}")]
    Request(String),

    #[error("Balance provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed balance response: {0}")]
    Malformed(String),
}

/// Failures from the messaging provider. The notifier logs these and
/// waits for the next trigger — there is no retry.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("SMS request failed: {0}")]
    Request(String),

    #[error("Messaging provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed delivery response: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
