//! Twilio SMS integration.
//!
//! Sends the daily summary as a single SMS to a fixed recipient.
//!
//! API docs: https://www.twilio.com/docs/messaging/api/message-resource
//! Endpoint: POST https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json
//! Auth: HTTP basic (account SID / auth token).
//! Bodies over 160 GSM-7 characters are segmented by Twilio transparently.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::MessageSink;
use crate::types::{DeliveryError, DeliveryReceipt};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const SINK_NAME: &str = "twilio";

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// The four credential fields Twilio requires. All must be present —
/// missing ones disable delivery entirely (see `notifier::Delivery`).
#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    /// E.164 sender number owned by the Twilio account.
    pub from_number: String,
    /// E.164 recipient number.
    pub to_number: String,
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// Response from the Messages endpoint. Only the fields we consume.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Twilio SMS sender for a fixed from/to pair.
pub struct TwilioSender {
    http: Client,
    credentials: TwilioCredentials,
}

impl TwilioSender {
    /// Create a new sender. Credential completeness is checked by the
    /// caller before construction.
    pub fn new(credentials: TwilioCredentials) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("TELLER/0.1.0 (balance-notifier)")
            .build()
            .context("Failed to build HTTP client for Twilio")?;

        Ok(Self { http, credentials })
    }

    fn messages_url(account_sid: &str) -> String {
        format!("{API_BASE}/Accounts/{account_sid}/Messages.json")
    }
}

#[async_trait]
impl MessageSink for TwilioSender {
    /// Submit one SMS and return its delivery receipt.
    async fn send(&self, body: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let url = Self::messages_url(&self.credentials.account_sid);

        debug!(to = %self.credentials.to_number, bytes = body.len(), "Submitting SMS");

        let resp = self
            .http
            .post(&url)
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .form(&[
                ("To", self.credentials.to_number.as_str()),
                ("From", self.credentials.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| DeliveryError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Api { status, body });
        }

        let message: MessageResponse = resp
            .json()
            .await
            .map_err(|e| DeliveryError::Malformed(e.to_string()))?;

        let sid = message
            .sid
            .ok_or_else(|| DeliveryError::Malformed("delivery response missing sid".to_string()))?;

        info!(sid = %sid, status = ?message.status, "SMS accepted by Twilio");

        Ok(DeliveryReceipt {
            sid,
            status: message.status,
            timestamp: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        SINK_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESPONSE: &str = r#"{
        "account_sid": "ACXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX",
        "body": "Account Balances:\nChecking: $1,234.50",
        "date_created": "Thu, 24 Aug 2023 05:01:45 +0000",
        "direction": "outbound-api",
        "error_code": null,
        "error_message": null,
        "from": "+15557122661",
        "num_segments": "1",
        "sid": "SMq4b5a3d2c1e0f9a8b7c6d5e4f3a2b1c0",
        "status": "queued",
        "to": "+15558675310"
    }"#;

    #[test]
    fn test_parse_message_response() {
        let parsed: MessageResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        assert_eq!(
            parsed.sid.as_deref(),
            Some("SMq4b5a3d2c1e0f9a8b7c6d5e4f3a2b1c0")
        );
        assert_eq!(parsed.status.as_deref(), Some("queued"));
    }

    #[test]
    fn test_parse_response_without_sid() {
        let parsed: MessageResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.sid.is_none());
        assert!(parsed.status.is_none());
    }

    #[test]
    fn test_messages_url() {
        assert_eq!(
            TwilioSender::messages_url("AC123"),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_new_sender() {
        let sender = TwilioSender::new(TwilioCredentials {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_number: "+15557122661".to_string(),
            to_number: "+15558675310".to_string(),
        });
        assert!(sender.is_ok());
        assert_eq!(sender.unwrap().name(), "twilio");
    }
}
