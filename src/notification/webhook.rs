//! Generic webhook sender, shared by the `webhook` and `custom_webhook` channels.

use super::{http_client, target_field, ChannelSender};
use crate::config::Settings;
use crate::core::{DeliveryTarget, Notification};
use crate::error::DispatchError;
use crate::formatting::RenderedBody;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// POSTs a JSON envelope to the target's URL. No authentication.
pub struct WebhookSender {
    settings: Arc<Settings>,
}

impl WebhookSender {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// The JSON document posted to the receiver.
    pub fn envelope(target: &DeliveryTarget, body: &RenderedBody, n: &Notification) -> Value {
        json!({
            "channel": target.channel,
            "title": n.title,
            "message": n.message,
            "severity": n.severity,
            "metadata": n.metadata,
            "body": body.to_string(),
            "sent_at": Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl ChannelSender for WebhookSender {
    fn name(&self) -> &'static str {
        "Webhook"
    }

    #[instrument(skip_all, fields(channel = %target.channel))]
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        body: &RenderedBody,
        notification: &Notification,
    ) -> Result<String, DispatchError> {
        let url = target_field(&target.webhook_url, "webhook_url")?;
        let envelope = Self::envelope(target, body, notification);

        let client = http_client(self.settings.request_timeout())?;
        let response = client.post(url).json(&envelope).send().await?;

        let status = response.status();
        debug!(%status, "Webhook responded");
        if status.is_success() {
            Ok(format!("Webhook delivered with status {}", status.as_u16()))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(DispatchError::Transport(format!(
                "webhook returned status {}: {}",
                status, text
            )))
        }
    }
}
