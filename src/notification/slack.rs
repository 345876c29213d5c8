//! A sender for Slack incoming webhooks.

use super::{http_client, required_setting, ChannelSender};
use crate::config::Settings;
use crate::core::{DeliveryTarget, Notification};
use crate::error::DispatchError;
use crate::formatting::RenderedBody;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

/// Posts `{text, blocks}` messages to the configured Slack webhook.
pub struct SlackSender {
    settings: Arc<Settings>,
}

impl SlackSender {
    /// Creates a new `SlackSender`.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    fn payload(body: &RenderedBody) -> Value {
        match body {
            RenderedBody::Slack(message) => message.to_payload(),
            RenderedBody::Text(text) => json!({ "text": text }),
        }
    }
}

#[async_trait]
impl ChannelSender for SlackSender {
    fn name(&self) -> &'static str {
        "Slack"
    }

    #[instrument(skip_all)]
    async fn deliver(
        &self,
        _target: &DeliveryTarget,
        body: &RenderedBody,
        _notification: &Notification,
    ) -> Result<String, DispatchError> {
        let webhook_url =
            required_setting(&self.settings.slack_default_webhook, "slack_default_webhook")?;
        let payload = Self::payload(body);

        let client = http_client(self.settings.request_timeout())?;
        let response = client.post(webhook_url).json(&payload).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok("Slack webhook delivered".to_string());
        }

        let text = response.text().await.unwrap_or_default();
        error!(
            status = %status,
            body = %text,
            "Failed to send Slack notification"
        );
        Err(DispatchError::Transport(format!(
            "Slack webhook returned status {}: {}",
            status, text
        )))
    }
}
