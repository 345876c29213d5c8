//! Telegram Bot API sender.
//!
//! Sends messages via `POST {api_base}/bot<token>/sendMessage`. Telegram
//! answers with `{"ok": bool, ...}`; an HTTP success carrying `ok: false`
//! is still a failed delivery.

use super::{http_client, required_setting, target_field, ChannelSender};
use crate::config::Settings;
use crate::core::{DeliveryTarget, Notification};
use crate::error::DispatchError;
use crate::formatting::RenderedBody;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// The subset of the Bot API reply we interpret.
#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramSender {
    settings: Arc<Settings>,
}

impl TelegramSender {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    fn send_message_url(&self, token: &str) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.settings.telegram_api_base.trim_end_matches('/'),
            token
        )
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    fn name(&self) -> &'static str {
        "Telegram"
    }

    #[instrument(skip_all)]
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        body: &RenderedBody,
        _notification: &Notification,
    ) -> Result<String, DispatchError> {
        let token = required_setting(&self.settings.telegram_bot_token, "telegram_bot_token")?;
        let chat_id = target_field(&target.telegram_chat_id, "telegram_chat_id")?;
        let payload = json!({
            "chat_id": chat_id,
            "text": body.to_string(),
        });

        let client = http_client(self.settings.request_timeout())?;
        let response = client
            .post(self.send_message_url(token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let reply = serde_json::from_str::<TelegramReply>(&text);

        if !status.is_success() {
            let reason = reply
                .ok()
                .and_then(|r| r.description)
                .unwrap_or(text);
            warn!(%status, %reason, "Telegram sendMessage failed");
            return Err(DispatchError::Transport(format!(
                "Telegram API returned status {}: {}",
                status, reason
            )));
        }

        let reply = reply.map_err(|e| {
            DispatchError::Unexpected(format!("malformed Telegram response: {}", e))
        })?;
        if !reply.ok {
            return Err(DispatchError::Provider(format!(
                "Telegram reported failure: {}",
                reply.description.as_deref().unwrap_or("no description")
            )));
        }

        debug!(chat_id, "Telegram message accepted");
        Ok(format!("Telegram message sent to chat {}", chat_id))
    }
}
