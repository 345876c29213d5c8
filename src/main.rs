//! notifyhub - Notification Dispatch Engine
//!
//! Reads one notification request (or an array of them) as JSON, dispatches
//! each through the configured providers and prints the responses as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use notifyhub::{
    cli::{Cli, RequestInput},
    config::Settings,
    internal_metrics::{self, LoggingRecorder},
    Dispatcher,
};
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit status when at least one request was not delivered.
const EXIT_UNDELIVERED: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Failed to load configuration: {}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    // Initialize logging. RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", settings.log_level);
    info!("Dry Run: {}", settings.dry_run);
    info!("Request Timeout: {}s", settings.request_timeout_seconds);
    info!("Slack: {}", configured(settings.slack_default_webhook.is_some()));
    info!(
        "SMTP: {}:{} (sender {})",
        settings.smtp_host,
        settings.smtp_port,
        settings.smtp_sender.as_deref().unwrap_or("not configured")
    );
    info!("Telegram: {}", configured(settings.telegram_bot_token.is_some()));
    info!("Twilio: {}", configured(settings.twilio_account_sid.is_some()));
    info!("-------------------------------------------------------");

    // Initialize Metrics Recorder if enabled
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let mut metrics_task = None;
    if settings.log_metrics {
        info!(
            "Logging recorder enabled. Metrics will be printed every {} seconds.",
            settings.metrics_interval_seconds
        );
        let (recorder, handle) = LoggingRecorder::new(settings.metrics_interval(), shutdown_rx);
        metrics::set_global_recorder(recorder)
            .map_err(|_| anyhow::anyhow!("a global metrics recorder is already installed"))?;
        internal_metrics::describe_metrics();
        metrics_task = Some(handle);
    }

    let input = read_input(&cli).context("Failed to read request input")?;
    let input = RequestInput::parse(&input).context("Failed to parse request JSON")?;

    let dispatcher = Dispatcher::new(Arc::new(settings));
    let (output, all_delivered) = match input {
        RequestInput::One(request) => {
            let response = dispatcher.dispatch(&request).await;
            let delivered = response.delivered;
            (serde_json::to_string_pretty(&response)?, delivered)
        }
        RequestInput::Many(requests) => {
            let responses = dispatcher.dispatch_all(&requests).await;
            let delivered = responses.iter().all(|r| r.delivered);
            (serde_json::to_string_pretty(&responses)?, delivered)
        }
    };
    println!("{}", output);

    // Flush the final metrics snapshot.
    if let Some(handle) = metrics_task {
        let _ = shutdown_tx.send(());
        if let Err(e) = handle.await {
            error!("Metrics task panicked: {:?}", e);
        }
    }

    if all_delivered {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_UNDELIVERED))
    }
}

fn read_input(cli: &Cli) -> Result<String> {
    match &cli.request {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn configured(enabled: bool) -> &'static str {
    if enabled {
        "Enabled"
    } else {
        "Not configured"
    }
}
