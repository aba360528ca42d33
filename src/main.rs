//! TELLER — Daily account-balance SMS notifier
//!
//! Entry point. Loads configuration, initialises structured logging to
//! stdout and an append-only file, builds the provider clients, and runs
//! the sleep-until-trigger loop with graceful shutdown.

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use teller::config;
use teller::messaging::twilio::{TwilioCredentials, TwilioSender};
use teller::notifier::{Delivery, Notifier};
use teller::providers::plaid::{PlaidClient, PlaidCredentials};
use teller::schedule::DailyTrigger;
use teller::types::RunReport;

const BANNER: &str = r#"
  _____  _____  _      _      _____  ____
 |_   _|| ____|| |    | |    | ____||  _ \
   | |  |  _|  | |    | |    |  _|  | |_) |
   | |  | |___ | |___ | |___ | |___ |  _ <
   |_|  |_____||_____||_____||_____||_| \_\

  Daily account-balance SMS notifier
  v0.1.0 — Scheduled Agent
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging; the guard flushes the file writer
    // on drop.
    let _log_guard = init_logging(&cfg.logging);

    // Print startup banner
    println!("{BANNER}");
    info!(
        notifier_name = %cfg.notifier.name,
        hour = cfg.notifier.hour,
        minute = cfg.notifier.minute,
        timezone = %cfg.notifier.timezone,
        "TELLER starting up"
    );

    // -- Initialise components -------------------------------------------

    // Balance provider. Missing credentials are a degraded-message
    // condition, not a startup failure.
    let plaid_credentials = PlaidCredentials {
        client_id: std::env::var(&cfg.balances.client_id_env).unwrap_or_default(),
        secret: std::env::var(&cfg.balances.secret_env).unwrap_or_default(),
        access_token: std::env::var(&cfg.balances.access_token_env).unwrap_or_default(),
    };
    if plaid_credentials.is_incomplete() {
        warn!("Balance provider credentials incomplete — summaries will carry the fallback text");
    }
    let source = PlaidClient::new(
        plaid_credentials,
        &cfg.balances.environment,
        cfg.balances.min_last_updated,
    )?;

    // Messaging sink. All four credentials must be present or delivery is
    // disabled and each firing logs the missing variables.
    let missing = cfg.messaging.missing();
    let delivery = if missing.is_empty() {
        let credentials = TwilioCredentials {
            account_sid: config::AppConfig::resolve_env(&cfg.messaging.account_sid_env)?,
            auth_token: config::AppConfig::resolve_env(&cfg.messaging.auth_token_env)?,
            from_number: config::AppConfig::resolve_env(&cfg.messaging.from_number_env)?,
            to_number: config::AppConfig::resolve_env(&cfg.messaging.to_number_env)?,
        };
        Delivery::Ready(Box::new(TwilioSender::new(credentials)?))
    } else {
        error!(missing = ?missing, "Messaging credentials incomplete — SMS delivery disabled");
        Delivery::Unconfigured { missing }
    };

    let notifier = Notifier::new(Box::new(source), delivery);

    // Trigger construction is the last fatal path; anything after this
    // point logs and keeps running.
    let trigger = DailyTrigger::new(cfg.notifier.hour, cfg.notifier.minute, &cfg.notifier.timezone)?;

    // -- Schedule loop ----------------------------------------------------

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(trigger = %trigger, "Entering schedule loop. Press Ctrl+C to stop.");

    loop {
        let next = trigger.next_fire(Utc::now());
        let wait = (next - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        info!(next = %next, wait_secs = wait.as_secs(), "Sleeping until next trigger");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let report = notifier.run_once().await;
                log_run_report(&report);
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("TELLER shut down cleanly.");
    Ok(())
}

/// Log a human-readable run summary.
fn log_run_report(report: &RunReport) {
    info!(
        accounts = report.accounts,
        degraded = report.degraded,
        delivered = report.delivered,
        sid = report.delivery_sid.as_deref().unwrap_or("-"),
        "Run complete"
    );
}

/// Initialise the `tracing` subscriber: console layer plus an append-only
/// file layer. Returns the file writer's flush guard.
fn init_logging(cfg: &config::LoggingConfig) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("teller=info"));

    let file_appender = tracing_appender::rolling::never(".", &cfg.file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_logging = std::env::var("TELLER_LOG_JSON").is_ok();

    if json_logging {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .with(file_layer)
            .init();
    } else {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .with(file_layer)
            .init();
    }

    guard
}
