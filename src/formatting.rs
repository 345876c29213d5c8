// src/formatting.rs

use crate::core::{Channel, Notification, Severity};
use serde_json::{json, Value};
use std::fmt;

const GENERIC_TYPE_LABEL: &str = "general";
const UNKNOWN_WINDOW: &str = "à confirmer";
const UNKNOWN_DURATION: &str = "inconnue";
const UNKNOWN_SERVICE: &str = "non précisé";

/// The alert categories that have dedicated templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Incident,
    Maintenance,
    Recovery,
    Generic,
}

impl AlertKind {
    /// Maps `metadata["type"]` to a template family.
    pub fn from_type(alert_type: Option<&str>) -> Self {
        match alert_type.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("incident") => AlertKind::Incident,
            Some("maintenance") => AlertKind::Maintenance,
            Some("recovery") => AlertKind::Recovery,
            _ => AlertKind::Generic,
        }
    }
}

/// How a channel wants its text shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Slack: summary line plus a block layout.
    Structured,
    /// Email and webhooks: multi-line prose.
    Prose,
    /// SMS and Telegram: one short line. Only Telegram gets emoji.
    Compact { emoji: bool },
}

impl Layout {
    fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::Slack => Layout::Structured,
            Channel::Email | Channel::Webhook | Channel::CustomWebhook => Layout::Prose,
            Channel::Telegram => Layout::Compact { emoji: true },
            Channel::Sms => Layout::Compact { emoji: false },
        }
    }
}

/// A Slack incoming-webhook message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackMessage {
    /// Top-level `text`, used by Slack for notifications and fallbacks.
    pub text: String,
    /// Body of the first (`section`) block.
    pub section: String,
    /// Elements of the second (`context`) block.
    pub context: Vec<String>,
}

impl SlackMessage {
    /// Builds the `{text, blocks}` payload expected by Slack.
    pub fn to_payload(&self) -> Value {
        let elements: Vec<Value> = self
            .context
            .iter()
            .map(|line| json!({ "type": "mrkdwn", "text": line }))
            .collect();

        json!({
            "text": self.text,
            "blocks": [
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": self.section }
                },
                {
                    "type": "context",
                    "elements": elements
                }
            ]
        })
    }
}

/// A channel-ready body produced by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedBody {
    Text(String),
    Slack(SlackMessage),
}

impl fmt::Display for RenderedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderedBody::Text(text) => f.write_str(text),
            RenderedBody::Slack(message) => {
                write!(f, "{}\n{}", message.text, message.section)?;
                for line in &message.context {
                    write!(f, "\n{}", line)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders notifications into channel-specific bodies.
///
/// Rendering is pure: no I/O, no clock, no counters. Every output embeds the
/// notification's title and message verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn render(&self, channel: Channel, notification: &Notification) -> RenderedBody {
        let kind = AlertKind::from_type(notification.alert_type());
        match Layout::for_channel(channel) {
            Layout::Structured => RenderedBody::Slack(self.slack(kind, notification)),
            Layout::Prose => RenderedBody::Text(self.prose(kind, notification)),
            Layout::Compact { emoji } => {
                RenderedBody::Text(self.compact(kind, notification, emoji))
            }
        }
    }

    fn prose(&self, kind: AlertKind, n: &Notification) -> String {
        match kind {
            AlertKind::Incident => format!(
                "{}: {}\n\n{}\n\nService: {}\nSévérité: {}",
                incident_headline(n),
                n.title,
                n.message,
                n.metadata_value("service").unwrap_or(UNKNOWN_SERVICE),
                n.severity
            ),
            AlertKind::Maintenance => format!(
                "Maintenance planifiée: {}\n\n{}\n\nFenêtre: {}",
                n.title,
                n.message,
                n.metadata_value("window").unwrap_or(UNKNOWN_WINDOW)
            ),
            AlertKind::Recovery => format!(
                "Service rétabli: {}\n\n{}\n\nDurée de l'interruption: {}",
                n.title,
                n.message,
                n.metadata_value("duration").unwrap_or(UNKNOWN_DURATION)
            ),
            AlertKind::Generic => format!(
                "[{}] {}\n\n{}\n\nType: {}",
                severity_tag(n),
                n.title,
                n.message,
                type_label(n)
            ),
        }
    }

    fn compact(&self, kind: AlertKind, n: &Notification, emoji: bool) -> String {
        let (icon, line) = match kind {
            AlertKind::Incident => (
                "\u{1f6a8}", // 🚨
                format!("INCIDENT {}: {} - {}", severity_tag(n), n.title, n.message),
            ),
            AlertKind::Maintenance => (
                "\u{1f527}", // 🔧
                format!(
                    "MAINTENANCE {} ({}): {}",
                    n.title,
                    n.metadata_value("window").unwrap_or(UNKNOWN_WINDOW),
                    n.message
                ),
            ),
            AlertKind::Recovery => (
                "\u{2705}", // ✅
                format!(
                    "RECOVERY {}: {} (durée {})",
                    n.title,
                    n.message,
                    n.metadata_value("duration").unwrap_or(UNKNOWN_DURATION)
                ),
            ),
            AlertKind::Generic => (
                "\u{1f514}", // 🔔
                format!("[{}] {}: {}", severity_tag(n), n.title, n.message),
            ),
        };

        if emoji {
            format!("{} {}", icon, line)
        } else {
            line
        }
    }

    fn slack(&self, kind: AlertKind, n: &Notification) -> SlackMessage {
        let (text, section) = match kind {
            AlertKind::Incident => {
                let icon = if n.severity == Severity::Critical {
                    ":rotating_light:"
                } else {
                    ":warning:"
                };
                (
                    format!("{} {}: {}", icon, incident_headline(n), n.title),
                    format!("*{}*\n{}", n.title, n.message),
                )
            }
            AlertKind::Maintenance => (
                format!(":wrench: Maintenance planifiée: {}", n.title),
                format!(
                    "*{}*\n{}\nFenêtre: {}",
                    n.title,
                    n.message,
                    n.metadata_value("window").unwrap_or(UNKNOWN_WINDOW)
                ),
            ),
            AlertKind::Recovery => (
                format!(":white_check_mark: Service rétabli: {}", n.title),
                format!(
                    "*{}*\n{}\nDurée de l'interruption: {}",
                    n.title,
                    n.message,
                    n.metadata_value("duration").unwrap_or(UNKNOWN_DURATION)
                ),
            ),
            AlertKind::Generic => (
                format!(":bell: [{}] {}", severity_tag(n), n.title),
                format!("*{}*\n{}", n.title, n.message),
            ),
        };

        let mut context = vec![
            format!("Sévérité: `{}`", n.severity),
            format!("Type: `{}`", type_label(n)),
        ];
        if let Some(service) = n.metadata_value("service") {
            context.push(format!("Service: `{}`", service));
        }

        SlackMessage {
            text,
            section,
            context,
        }
    }
}

fn incident_headline(n: &Notification) -> &'static str {
    if n.severity == Severity::Critical {
        "Incident critique"
    } else {
        "Incident"
    }
}

fn severity_tag(n: &Notification) -> String {
    n.severity.as_str().to_ascii_uppercase()
}

fn type_label(n: &Notification) -> &str {
    n.alert_type().unwrap_or(GENERIC_TYPE_LABEL)
}
