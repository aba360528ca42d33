//! Plaid balance integration.
//!
//! Fetches real-time account balances for a linked Item.
//!
//! API docs: https://plaid.com/docs/api/products/balance/
//! Endpoint: POST {env}/accounts/balance/get
//! Auth: client_id + secret + access_token in the JSON body.
//! Environments: sandbox | development | production.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::BalanceSource;
use crate::types::{BalanceRecord, ProviderError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const PROVIDER_NAME: &str = "plaid";

const SANDBOX_URL: &str = "https://sandbox.plaid.com";
const DEVELOPMENT_URL: &str = "https://development.plaid.com";
const PRODUCTION_URL: &str = "https://production.plaid.com";

/// Credentials for one Plaid Item, resolved from the environment at start.
#[derive(Debug, Clone)]
pub struct PlaidCredentials {
    pub client_id: String,
    pub secret: String,
    pub access_token: String,
}

impl PlaidCredentials {
    /// Whether any field is empty — requests will fail auth, which the
    /// notifier degrades to the placeholder body.
    pub fn is_incomplete(&self) -> bool {
        self.client_id.is_empty() || self.secret.is_empty() || self.access_token.is_empty()
    }
}

// ---------------------------------------------------------------------------
// API request/response types (Plaid JSON ↔ Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct BalanceGetRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<BalanceGetOptions>,
}

#[derive(Debug, Serialize)]
struct BalanceGetOptions {
    /// RFC 3339. Accounts not refreshed since this instant are excluded.
    min_last_updated_datetime: String,
}

/// Response from `/accounts/balance/get`. Only the fields we consume.
#[derive(Debug, Deserialize)]
struct BalanceGetResponse {
    #[serde(default)]
    accounts: Vec<PlaidAccount>,
    #[serde(default)]
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct PlaidAccount {
    name: String,
    balances: PlaidBalances,
    #[serde(default)]
    subtype: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaidBalances {
    /// Total funds in the account. Absent for some investment accounts.
    #[serde(default)]
    current: Option<Decimal>,
    #[serde(default)]
    iso_currency_code: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Plaid balance client for a single linked Item.
pub struct PlaidClient {
    http: Client,
    credentials: PlaidCredentials,
    base_url: String,
    min_last_updated: Option<DateTime<Utc>>,
}

impl PlaidClient {
    /// Create a new Plaid client for the given environment.
    ///
    /// Unknown environment names fail here — a startup error, not a
    /// per-run one.
    pub fn new(
        credentials: PlaidCredentials,
        environment: &str,
        min_last_updated: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let base_url = Self::base_url(environment)?.to_string();

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("TELLER/0.1.0 (balance-notifier)")
            .build()
            .context("Failed to build HTTP client for Plaid")?;

        Ok(Self {
            http,
            credentials,
            base_url,
            min_last_updated,
        })
    }

    fn base_url(environment: &str) -> Result<&'static str> {
        match environment {
            "sandbox" => Ok(SANDBOX_URL),
            "development" => Ok(DEVELOPMENT_URL),
            "production" => Ok(PRODUCTION_URL),
            other => anyhow::bail!("Unknown Plaid environment: {other}"),
        }
    }

    /// Convert a Plaid account to a `BalanceRecord`.
    /// Accounts with no current balance are skipped.
    fn to_record(account: PlaidAccount) -> Option<BalanceRecord> {
        let current = account.current()?;
        Some(BalanceRecord::new(account.name, current))
    }
}

impl PlaidAccount {
    fn current(&self) -> Option<Decimal> {
        self.balances.current
    }
}

#[async_trait]
impl BalanceSource for PlaidClient {
    /// Fetch current balances for every account on the Item.
    async fn fetch_balances(&self) -> Result<Vec<BalanceRecord>, ProviderError> {
        let url = format!("{}/accounts/balance/get", self.base_url);
        let request = BalanceGetRequest {
            client_id: &self.credentials.client_id,
            secret: &self.credentials.secret,
            access_token: &self.credentials.access_token,
            options: self.min_last_updated.map(|at| BalanceGetOptions {
                min_last_updated_datetime: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            }),
        };

        debug!(url = %url, "Fetching Plaid balances");

        let resp = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: BalanceGetResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let total = parsed.accounts.len();
        let records: Vec<BalanceRecord> = parsed
            .accounts
            .into_iter()
            .filter_map(Self::to_record)
            .collect();

        if records.len() < total {
            debug!(
                skipped = total - records.len(),
                "Accounts without a current balance were skipped"
            );
        }

        info!(
            request_id = %parsed.request_id,
            accounts = records.len(),
            "Plaid balances fetched"
        );

        Ok(records)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
