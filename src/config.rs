//! Configuration management for notifyhub
//!
//! This module defines the `Settings` struct holding every provider credential
//! and endpoint the dispatcher needs. It uses the `figment` crate to layer
//! built-in defaults, an optional `notifyhub.toml` file, `NOTIFYHUB_`
//! environment variables and command-line flags.
//!
//! Settings are loaded once at startup and shared read-only behind an `Arc`.

use crate::cli::Cli;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// The default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "notifyhub.toml";

/// Prefix of the environment variables read by `Settings::load`.
pub const ENV_PREFIX: &str = "NOTIFYHUB_";

/// String settings taken from the environment exactly as written.
///
/// figment parses env values, so `+15550100` would arrive as the integer
/// `15550100`. Credentials and phone numbers must stay untouched.
const VERBATIM_ENV_KEYS: &[&str] = &[
    "log_level",
    "slack_default_webhook",
    "smtp_sender",
    "smtp_host",
    "smtp_username",
    "smtp_password",
    "telegram_api_base",
    "telegram_bot_token",
    "twilio_api_base",
    "twilio_account_sid",
    "twilio_auth_token",
    "twilio_from_number",
];

/// Process-wide, immutable dispatcher settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// The logging level for the application.
    pub log_level: String,
    /// Periodically log dispatch metrics.
    #[serde(default)]
    pub log_metrics: bool,
    /// Interval between metrics log snapshots, in seconds.
    pub metrics_interval_seconds: u64,
    /// Skip every outbound provider call.
    pub dry_run: bool,
    /// Upper bound for each outbound call, in seconds.
    pub request_timeout_seconds: u64,

    /// The Slack incoming webhook used for the `slack` channel.
    pub slack_default_webhook: Option<String>,

    /// The `From` address for e-mail notifications.
    pub smtp_sender: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Upgrade the SMTP connection with STARTTLS.
    pub smtp_starttls: bool,

    /// Base URL of the Telegram Bot API.
    pub telegram_api_base: String,
    pub telegram_bot_token: Option<String>,

    /// Base URL of the Twilio-compatible Messages API.
    pub twilio_api_base: String,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: Option<String>,
}

impl Settings {
    /// Loads the settings by layering defaults, the TOML file, environment
    /// variables and command-line arguments, in that order.
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // e.g. NOTIFYHUB_DRY_RUN=true or NOTIFYHUB_SMTP_PORT=2525
            .merge(Env::prefixed(ENV_PREFIX).ignore(VERBATIM_ENV_KEYS))
            // e.g. NOTIFYHUB_TWILIO_FROM_NUMBER=+15550100
            .merge(Serialized::defaults(verbatim_env()))
            .merge(cli)
            .extract()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_seconds)
    }
}

fn verbatim_env() -> BTreeMap<String, String> {
    Env::prefixed(ENV_PREFIX)
        .only(VERBATIM_ENV_KEYS)
        .iter()
        .map(|(key, value)| (key.as_str().to_string(), value))
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_metrics: false,
            metrics_interval_seconds: 60,
            dry_run: false,
            request_timeout_seconds: 10,
            slack_default_webhook: None,
            smtp_sender: None,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_starttls: true,
            telegram_api_base: "https://api.telegram.org".to_string(),
            telegram_bot_token: None,
            twilio_api_base: "https://api.twilio.com".to_string(),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
        }
    }
}
