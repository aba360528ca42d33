//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (provider credentials, phone numbers) are referenced by env-var
//! name in the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub notifier: NotifierConfig,
    pub balances: BalancesConfig,
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierConfig {
    pub name: String,
    /// Daily send time, wall-clock in `timezone`.
    pub hour: u32,
    pub minute: u32,
    /// IANA timezone name, e.g. "America/Los_Angeles".
    pub timezone: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BalancesConfig {
    /// Plaid environment: "sandbox" | "development" | "production".
    pub environment: String,
    pub client_id_env: String,
    pub secret_env: String,
    pub access_token_env: String,
    /// Only include accounts refreshed after this instant.
    #[serde(default)]
    pub min_last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagingConfig {
    pub account_sid_env: String,
    pub auth_token_env: String,
    pub from_number_env: String,
    pub to_number_env: String,
}

impl MessagingConfig {
    /// The four env vars that must all be set for SMS delivery.
    pub fn required_envs(&self) -> [&str; 4] {
        [
            &self.account_sid_env,
            &self.auth_token_env,
            &self.from_number_env,
            &self.to_number_env,
        ]
    }

    /// Names of required env vars that are unset or empty. Delivery is
    /// disabled unless this is empty.
    pub fn missing(&self) -> Vec<String> {
        self.required_envs()
            .iter()
            .filter(|name| {
                std::env::var(name)
                    .map(|value| value.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|name| name.to_string())
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Append-only log file, written alongside stdout.
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

fn default_log_file() -> String {
    "teller.log".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
