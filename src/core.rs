//! Core domain types for notifyhub
//!
//! This module defines the value objects that flow through the dispatch
//! pipeline: what to send (`Notification`), where to send it
//! (`DeliveryTarget`), and the uniform outcome (`DispatchResponse`).

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How urgent a notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized notification, independent of any delivery channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Notification {
    /// Short headline
    pub title: String,
    /// Free-form body text
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    /// Contextual keys such as `type`, `service`, `duration` or `window`
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Notification {
    /// The alert category used for template selection, if any.
    pub fn alert_type(&self) -> Option<&str> {
        self.metadata_value("type")
    }

    /// Returns a metadata value, treating blank values as absent.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// The closed set of delivery channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Webhook,
    CustomWebhook,
    Slack,
    Email,
    Telegram,
    Sms,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Webhook,
        Channel::CustomWebhook,
        Channel::Slack,
        Channel::Email,
        Channel::Telegram,
        Channel::Sms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Webhook => "webhook",
            Channel::CustomWebhook => "custom_webhook",
            Channel::Slack => "slack",
            Channel::Email => "email",
            Channel::Telegram => "telegram",
            Channel::Sms => "sms",
        }
    }

    /// The provider category; both webhook flavours share one.
    pub fn category(&self) -> &'static str {
        match self {
            Channel::Webhook | Channel::CustomWebhook => "webhook",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a notification should be delivered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryTarget {
    pub channel: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl DeliveryTarget {
    /// Creates a target for `channel` with no channel-specific fields set.
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            webhook_url: None,
            email_to: None,
            telegram_chat_id: None,
            phone_number: None,
        }
    }

    pub fn webhook(url: impl Into<String>) -> Self {
        Self {
            webhook_url: Some(url.into()),
            ..Self::new(Channel::Webhook)
        }
    }

    pub fn email(to: impl Into<String>) -> Self {
        Self {
            email_to: Some(to.into()),
            ..Self::new(Channel::Email)
        }
    }

    pub fn telegram(chat_id: impl Into<String>) -> Self {
        Self {
            telegram_chat_id: Some(chat_id.into()),
            ..Self::new(Channel::Telegram)
        }
    }

    pub fn sms(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: Some(phone_number.into()),
            ..Self::new(Channel::Sms)
        }
    }

    /// The field the chosen channel cannot do without, if any.
    pub fn required_field(&self) -> Option<&'static str> {
        match self.channel {
            Channel::Webhook | Channel::CustomWebhook => Some("webhook_url"),
            Channel::Slack => None,
            Channel::Email => Some("email_to"),
            Channel::Telegram => Some("telegram_chat_id"),
            Channel::Sms => Some("phone_number"),
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "webhook_url" => self.webhook_url.as_deref(),
            "email_to" => self.email_to.as_deref(),
            "telegram_chat_id" => self.telegram_chat_id.as_deref(),
            "phone_number" => self.phone_number.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Checks that the field required by `channel` is present and usable.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let Some(required) = self.required_field() else {
            return Ok(());
        };
        let value = self.field(required).ok_or_else(|| {
            DispatchError::Validation(format!(
                "channel '{}' requires '{}'",
                self.channel, required
            ))
        })?;

        // Values are forwarded to providers as given, so padding is refused
        // rather than silently stripped.
        if value.trim() != value {
            return Err(DispatchError::Validation(format!(
                "'{}' has leading or trailing whitespace",
                required
            )));
        }

        if required == "webhook_url" {
            let url = url::Url::parse(value).map_err(|e| {
                DispatchError::Validation(format!("invalid webhook_url '{}': {}", value, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(DispatchError::Validation(format!(
                    "webhook_url must use http or https, got '{}'",
                    url.scheme()
                )));
            }
        }
        Ok(())
    }
}

/// One notification paired with one delivery target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRequest {
    pub notification: Notification,
    pub target: DeliveryTarget,
}

/// The uniform outcome of a dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchResponse {
    pub delivered: bool,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResponse {
    pub fn delivered(detail: impl Into<String>) -> Self {
        Self {
            delivered: true,
            detail: detail.into(),
            error: None,
        }
    }

    pub fn failed(detail: impl Into<String>, error: &DispatchError) -> Self {
        Self {
            delivered: false,
            detail: detail.into(),
            error: Some(error.to_string()),
        }
    }
}
