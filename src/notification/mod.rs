//! Channel senders: one adapter per delivery provider.
//!
//! Every sender turns a rendered body into exactly one provider call and
//! interprets the provider's answer. Provider-specific response shapes stay
//! inside each sender; callers only ever see a `DispatchResponse`.
pub mod dry_run;
pub mod email;
pub mod slack;
pub mod sms;
pub mod telegram;
pub mod webhook;

use crate::config::Settings;
use crate::core::{Channel, DeliveryTarget, DispatchResponse, Notification};
use crate::error::DispatchError;
use crate::formatting::RenderedBody;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub use dry_run::DryRunSender;
pub use email::{EmailSender, Mailer, SmtpMailer};
pub use slack::SlackSender;
pub use sms::SmsSender;
pub use telegram::TelegramSender;
pub use webhook::WebhookSender;

/// A delivery adapter for one provider.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// A human-readable sender name (e.g., "Slack", "Telegram").
    fn name(&self) -> &'static str;

    /// Performs the provider call.
    ///
    /// # Returns
    /// * `Ok(detail)` with a human-readable outcome on success
    /// * `Err` for any transport, provider or configuration failure
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        body: &RenderedBody,
        notification: &Notification,
    ) -> Result<String, DispatchError>;

    /// Delivers and folds the outcome into a `DispatchResponse`. Never fails.
    async fn send(
        &self,
        target: &DeliveryTarget,
        body: &RenderedBody,
        notification: &Notification,
    ) -> DispatchResponse {
        match self.deliver(target, body, notification).await {
            Ok(detail) => {
                info!(sender = self.name(), %detail, "Notification delivered");
                DispatchResponse::delivered(detail)
            }
            Err(e) => {
                warn!(sender = self.name(), error = %e, "Notification delivery failed");
                DispatchResponse::failed(format!("{} delivery failed", self.name()), &e)
            }
        }
    }
}

/// Builds an HTTP client for a single provider call.
///
/// Clients are not shared between dispatches, so no connection state
/// survives from one call to the next.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, DispatchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DispatchError::Unexpected(format!("failed to build HTTP client: {}", e)))
}

/// Returns the value of an optional setting or a configuration error naming it.
pub(crate) fn required_setting<'a>(
    value: &'a Option<String>,
    name: &str,
) -> Result<&'a str, DispatchError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DispatchError::Configuration(format!("'{}' is not set", name)))
}

/// Returns a target field the dispatcher has already validated, unchanged.
pub(crate) fn target_field<'a>(
    value: &'a Option<String>,
    name: &str,
) -> Result<&'a str, DispatchError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DispatchError::Validation(format!("target is missing '{}'", name)))
}

/// The closed mapping from `Channel` to its sender.
pub struct SenderRegistry {
    webhook: WebhookSender,
    slack: SlackSender,
    email: EmailSender,
    telegram: TelegramSender,
    sms: SmsSender,
    dry_run: DryRunSender,
}

impl SenderRegistry {
    /// Creates the registry with an SMTP mailer built from `settings`.
    pub fn new(settings: Arc<Settings>) -> Self {
        let mailer = Arc::new(SmtpMailer::from_settings(&settings));
        Self::with_mailer(settings, mailer)
    }

    /// Creates the registry with a custom mail transport.
    pub fn with_mailer(settings: Arc<Settings>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            webhook: WebhookSender::new(settings.clone()),
            slack: SlackSender::new(settings.clone()),
            email: EmailSender::new(settings.clone(), mailer),
            telegram: TelegramSender::new(settings.clone()),
            sms: SmsSender::new(settings),
            dry_run: DryRunSender,
        }
    }

    /// The sender performing real deliveries for `channel`.
    pub fn for_channel(&self, channel: Channel) -> &dyn ChannelSender {
        match channel {
            Channel::Webhook | Channel::CustomWebhook => &self.webhook,
            Channel::Slack => &self.slack,
            Channel::Email => &self.email,
            Channel::Telegram => &self.telegram,
            Channel::Sms => &self.sms,
        }
    }

    /// The sender answering every channel while dry-run is on.
    pub fn dry_run(&self) -> &dyn ChannelSender {
        &self.dry_run
    }
}
