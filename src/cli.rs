//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `notifyhub.toml` file and environment variables.

use crate::core::NotificationRequest;
use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Render and deliver notifications to webhooks, Slack, e-mail, Telegram or SMS.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON file holding one request or an array of requests. Reads stdin when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Skip all provider calls and report what would have been sent.
    #[arg(long)]
    pub dry_run: bool,

    /// Override the configured log level.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log dispatch metrics.
    #[arg(long)]
    pub log_metrics: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        // Flags only ever switch things on; absence leaves lower layers intact.
        if self.dry_run {
            dict.insert("dry_run".into(), Value::from(true));
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if self.log_metrics {
            dict.insert("log_metrics".into(), Value::from(true));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}

/// The JSON input accepted by the binary.
#[derive(Debug)]
pub enum RequestInput {
    One(Box<NotificationRequest>),
    Many(Vec<NotificationRequest>),
}

impl RequestInput {
    /// Parses one request object or an array of them.
    ///
    /// The shape is picked from the first character so that serde reports
    /// field-level errors for the variant actually supplied.
    pub fn parse(input: &str) -> Result<Self, serde_json::Error> {
        if input.trim_start().starts_with('[') {
            serde_json::from_str(input).map(RequestInput::Many)
        } else {
            serde_json::from_str(input).map(RequestInput::One)
        }
    }

    pub fn into_requests(self) -> Vec<NotificationRequest> {
        match self {
            RequestInput::One(request) => vec![*request],
            RequestInput::Many(requests) => requests,
        }
    }
}
