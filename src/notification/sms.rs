//! SMS sender for the Twilio Messages API.

use super::{http_client, required_setting, target_field, ChannelSender};
use crate::config::Settings;
use crate::core::{DeliveryTarget, Notification};
use crate::error::DispatchError;
use crate::formatting::RenderedBody;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Queues an SMS with a form-encoded `POST .../Messages.json` and HTTP basic auth.
pub struct SmsSender {
    settings: Arc<Settings>,
}

impl SmsSender {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    fn messages_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.settings.twilio_api_base.trim_end_matches('/'),
            account_sid
        )
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn name(&self) -> &'static str {
        "SMS"
    }

    #[instrument(skip_all)]
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        body: &RenderedBody,
        _notification: &Notification,
    ) -> Result<String, DispatchError> {
        let account_sid = required_setting(&self.settings.twilio_account_sid, "twilio_account_sid")?;
        let auth_token = required_setting(&self.settings.twilio_auth_token, "twilio_auth_token")?;
        let from = required_setting(&self.settings.twilio_from_number, "twilio_from_number")?;
        let to = target_field(&target.phone_number, "phone_number")?;

        let text = body.to_string();
        let params = [("To", to), ("From", from), ("Body", text.as_str())];

        let client = http_client(self.settings.request_timeout())?;
        let response = client
            .post(self.messages_url(account_sid))
            .basic_auth(account_sid, Some(auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // Twilio answers 201 Created once the message is queued.
        if status != StatusCode::CREATED {
            let reason = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            warn!(%status, %reason, "SMS request rejected");
            return Err(DispatchError::Transport(format!(
                "Twilio returned status {}: {}",
                status, reason
            )));
        }

        let reply: Value = serde_json::from_str(&text)
            .map_err(|e| DispatchError::Unexpected(format!("malformed Twilio response: {}", e)))?;
        let sid = reply
            .get("sid")
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::Unexpected("Twilio response has no 'sid'".to_string()))?;

        Ok(format!("SMS message queued with sid {}", sid))
    }
}
