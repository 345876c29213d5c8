#![allow(dead_code)]

pub mod fixtures;

use notifyhub::config::Settings;
use wiremock::MockServer;

/// Settings whose HTTP providers all point at `server`.
///
/// The Slack webhook is `{server}/slack`, Telegram and Twilio use the server
/// as their API base. Timeouts are short so failing tests finish quickly.
pub fn settings_for(server: &MockServer) -> Settings {
    Settings {
        request_timeout_seconds: 2,
        slack_default_webhook: Some(format!("{}/slack", server.uri())),
        smtp_sender: Some("alerts@example.com".to_string()),
        telegram_api_base: server.uri(),
        telegram_bot_token: Some("test-token".to_string()),
        twilio_api_base: server.uri(),
        twilio_account_sid: Some("AC123".to_string()),
        twilio_auth_token: Some("secret".to_string()),
        twilio_from_number: Some("+15550000".to_string()),
        ..Default::default()
    }
}
