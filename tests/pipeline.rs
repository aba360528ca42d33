//! End-to-end pipeline tests with mock providers.
//!
//! A scripted `BalanceSource` and a recording `MessageSink` stand in for
//! Plaid and Twilio — all state is in-memory and fully controllable from
//! test code, so each property of the fetch→format→send pipeline can be
//! asserted deterministically.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

use teller::messaging::MessageSink;
use teller::notifier::{format_message, Delivery, Notifier, FETCH_FALLBACK};
use teller::providers::BalanceSource;
use teller::types::{BalanceRecord, DeliveryError, DeliveryReceipt, ProviderError};

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

/// A balance source returning a fixed set of records, or a forced error.
struct MockSource {
    records: Vec<BalanceRecord>,
    force_error: bool,
}

impl MockSource {
    fn with_records(records: Vec<BalanceRecord>) -> Self {
        Self {
            records,
            force_error: false,
        }
    }

    fn failing() -> Self {
        Self {
            records: Vec::new(),
            force_error: true,
        }
    }
}

#[async_trait]
impl BalanceSource for MockSource {
    async fn fetch_balances(&self) -> Result<Vec<BalanceRecord>, ProviderError> {
        if self.force_error {
            return Err(ProviderError::Request("simulated outage".to_string()));
        }
        Ok(self.records.clone())
    }

    fn name(&self) -> &str {
        "mock-source"
    }
}

/// A sink recording every body it is asked to deliver.
struct MockSink {
    sent: Arc<Mutex<Vec<String>>>,
    force_error: bool,
}

impl MockSink {
    fn recording() -> (Self, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                sent: Arc::clone(&sent),
                force_error: false,
            },
            sent,
        )
    }

    fn failing() -> (Self, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                sent: Arc::clone(&sent),
                force_error: true,
            },
            sent,
        )
    }
}

#[async_trait]
impl MessageSink for MockSink {
    async fn send(&self, body: &str) -> Result<DeliveryReceipt, DeliveryError> {
        if self.force_error {
            return Err(DeliveryError::Api {
                status: 401,
                body: "authentication failed".to_string(),
            });
        }
        self.sent.lock().unwrap().push(body.to_string());
        Ok(DeliveryReceipt {
            sid: format!("SM-MOCK-{:04}", self.sent.lock().unwrap().len()),
            status: Some("queued".to_string()),
            timestamp: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "mock-sink"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_end_to_end_single_account() {
    let source = MockSource::with_records(vec![BalanceRecord::new("Checking", dec!(1234.5))]);
    let (sink, sent) = MockSink::recording();
    let notifier = Notifier::new(Box::new(source), Delivery::Ready(Box::new(sink)));

    let report = notifier.run_once().await;

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "sink must be invoked exactly once");
    assert_eq!(sent[0], "Account Balances:\nChecking: $1,234.50");

    assert_eq!(report.accounts, 1);
    assert!(!report.degraded);
    assert!(report.delivered);
    assert_eq!(report.delivery_sid.as_deref(), Some("SM-MOCK-0001"));
}

#[tokio::test]
async fn test_message_has_one_line_per_account_plus_header() {
    let records = vec![
        BalanceRecord::new("Checking", dec!(1234.5)),
        BalanceRecord::new("Savings", dec!(1000000)),
        BalanceRecord::new("Credit Card", dec!(-42.07)),
    ];
    let source = MockSource::with_records(records.clone());
    let (sink, sent) = MockSink::recording();
    let notifier = Notifier::new(Box::new(source), Delivery::Ready(Box::new(sink)));

    notifier.run_once().await;

    let sent = sent.lock().unwrap();
    let lines: Vec<&str> = sent[0].lines().collect();
    assert_eq!(lines.len(), records.len() + 1);
    assert_eq!(lines[0], "Account Balances:");
    assert_eq!(lines[2], "Savings: $1,000,000.00");
}

#[tokio::test]
async fn test_zero_accounts_sends_header_only() {
    let source = MockSource::with_records(Vec::new());
    let (sink, sent) = MockSink::recording();
    let notifier = Notifier::new(Box::new(source), Delivery::Ready(Box::new(sink)));

    let report = notifier.run_once().await;

    assert_eq!(sent.lock().unwrap()[0], "Account Balances:");
    assert_eq!(report.accounts, 0);
    assert!(!report.degraded);
}

#[tokio::test]
async fn test_fetch_failure_sends_placeholder() {
    let source = MockSource::failing();
    let (sink, sent) = MockSink::recording();
    let notifier = Notifier::new(Box::new(source), Delivery::Ready(Box::new(sink)));

    let report = notifier.run_once().await;

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], FETCH_FALLBACK);

    assert!(report.degraded);
    assert!(report.delivered);
    assert_eq!(report.accounts, 0);
}

#[tokio::test]
async fn test_delivery_failure_completes_the_run() {
    let source = MockSource::with_records(vec![BalanceRecord::new("Checking", dec!(10))]);
    let (sink, sent) = MockSink::failing();
    let notifier = Notifier::new(Box::new(source), Delivery::Ready(Box::new(sink)));

    let report = notifier.run_once().await;

    assert!(sent.lock().unwrap().is_empty());
    assert!(!report.delivered);
    assert!(report.delivery_sid.is_none());
    assert_eq!(report.accounts, 1);
}

#[tokio::test]
async fn test_unconfigured_delivery_skips_send() {
    let source = MockSource::with_records(vec![BalanceRecord::new("Checking", dec!(10))]);
    let notifier = Notifier::new(
        Box::new(source),
        Delivery::Unconfigured {
            missing: vec!["TWILIO_AUTH_TOKEN".to_string()],
        },
    );

    let report = notifier.run_once().await;

    assert!(!report.delivered);
    assert!(report.delivery_sid.is_none());
    // The fetch still happened; only the send was skipped.
    assert_eq!(report.accounts, 1);
    assert!(!report.degraded);
}

#[tokio::test]
async fn test_fetch_failure_with_unconfigured_delivery() {
    // Both provider calls unavailable: the run still completes quietly.
    let source = MockSource::failing();
    let notifier = Notifier::new(
        Box::new(source),
        Delivery::Unconfigured {
            missing: vec![
                "TWILIO_ACCOUNT_SID".to_string(),
                "TWILIO_AUTH_TOKEN".to_string(),
                "TWILIO_PHONE_NUMBER".to_string(),
                "TO_PHONE_NUMBER".to_string(),
            ],
        },
    );

    let report = notifier.run_once().await;
    assert!(report.degraded);
    assert!(!report.delivered);
}

#[tokio::test]
async fn test_consecutive_runs_are_independent() {
    let source = MockSource::with_records(vec![BalanceRecord::new("Checking", dec!(55.5))]);
    let (sink, sent) = MockSink::recording();
    let notifier = Notifier::new(Box::new(source), Delivery::Ready(Box::new(sink)));

    let first = notifier.run_once().await;
    let second = notifier.run_once().await;

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(first.delivery_sid.as_deref(), Some("SM-MOCK-0001"));
    assert_eq!(second.delivery_sid.as_deref(), Some("SM-MOCK-0002"));
}

#[test]
fn test_format_message_matches_delivery_body() {
    let records = vec![BalanceRecord::new("Checking", dec!(1234.5))];
    assert_eq!(
        format_message(&records),
        "Account Balances:\nChecking: $1,234.50"
    );
}
