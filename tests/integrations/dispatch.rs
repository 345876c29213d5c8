//! End-to-end dispatch tests against mocked providers.

use notifyhub::config::Settings;
use notifyhub::core::{Channel, DeliveryTarget, Notification};
use notifyhub::Dispatcher;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{basic_auth, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::{fake_mailer::FakeMailer, fixtures, settings_for};

fn dispatcher(settings: Settings) -> Dispatcher {
    Dispatcher::new(Arc::new(settings))
}

async fn received_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn test_slack_delivery_posts_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slack"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::new(Channel::Slack),
        ))
        .await;

    assert!(response.delivered, "{:?}", response);
    assert!(response.detail.contains("Slack webhook delivered"));
    assert!(response.error.is_none());

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let type_element = body["blocks"][1]["elements"][1]["text"].as_str().unwrap();
    assert!(type_element.contains("Type: `incident`"), "{}", type_element);
    assert!(body["text"].as_str().unwrap().contains("API latency"));
}

#[tokio::test]
async fn test_slack_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slack"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::new(Channel::Slack),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(response.detail, "Slack delivery failed");
    assert!(response.error.unwrap().contains("500"));
}

#[tokio::test]
async fn test_telegram_delivery_reports_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .and(body_partial_json(json!({ "chat_id": "12345" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true, "result": { "message_id": 42 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::telegram("12345"),
        ))
        .await;

    assert!(response.delivered, "{:?}", response);
    assert_eq!(response.detail, "Telegram message sent to chat 12345");

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["chat_id"], "12345");
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("API latency") && text.contains("p99 above 2s on checkout"));
}

#[tokio::test]
async fn test_telegram_logical_failure_is_not_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": false, "description": "Bad Request: chat not found" })),
        )
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::telegram("999"),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(response.detail, "Telegram delivery failed");
    let error = response.error.unwrap();
    assert!(error.starts_with("provider rejected the request"), "{}", error);
    assert!(error.contains("chat not found"));
}

#[tokio::test]
async fn test_sms_delivery_queues_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(basic_auth("AC123", "secret"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM123" })))
        .expect(1)
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::maintenance(),
            DeliveryTarget::sms("+33612345678"),
        ))
        .await;

    assert!(response.delivered, "{:?}", response);
    assert_eq!(response.detail, "SMS message queued with sid SM123");

    let requests = server.received_requests().await.unwrap();
    let form: HashMap<String, String> = url::form_urlencoded::parse(&requests[0].body)
        .into_owned()
        .collect();
    assert_eq!(form["To"], "+33612345678");
    assert_eq!(form["From"], "+15550000");
    assert!(form["Body"].contains("MAINTENANCE"), "{}", form["Body"]);
    assert!(form["Body"].contains("Database upgrade"));
}

#[tokio::test]
async fn test_sms_rejection_surfaces_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number."
        })))
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::sms("not-a-number"),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(response.detail, "SMS delivery failed");
    assert!(response.error.unwrap().contains("not a valid phone number"));
}

#[tokio::test]
async fn test_webhook_delivery_and_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/ok"))
        .and(body_partial_json(json!({ "title": "API latency", "severity": "critical" })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(settings_for(&server));

    let ok = dispatcher
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::webhook(format!("{}/hooks/ok", server.uri())),
        ))
        .await;
    assert!(ok.delivered, "{:?}", ok);
    assert_eq!(ok.detail, "Webhook delivered with status 202");

    let custom = DeliveryTarget {
        channel: Channel::CustomWebhook,
        ..DeliveryTarget::webhook(format!("{}/hooks/missing", server.uri()))
    };
    let missing = dispatcher
        .dispatch(&fixtures::request(fixtures::incident(), custom))
        .await;
    assert!(!missing.delivered);
    assert_eq!(missing.detail, "Webhook delivery failed");
    assert!(missing.error.unwrap().contains("404"));
}

#[tokio::test]
async fn test_dry_run_makes_no_outbound_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = Settings {
        dry_run: true,
        ..settings_for(&server)
    };
    let dispatcher = Dispatcher::with_mailer(settings.into(), Arc::new(FakeMailer::default()));

    for channel in Channel::ALL {
        let target = DeliveryTarget {
            webhook_url: Some(format!("{}/hooks", server.uri())),
            email_to: Some("ops@example.com".to_string()),
            telegram_chat_id: Some("12345".to_string()),
            phone_number: Some("+33612345678".to_string()),
            ..DeliveryTarget::new(channel)
        };
        let response = dispatcher
            .dispatch(&fixtures::request(fixtures::incident(), target))
            .await;

        assert!(response.delivered, "{}: {:?}", channel, response);
        assert_eq!(
            response.detail,
            format!("Dry-run: {} call skipped", channel.category())
        );
    }

    assert_eq!(received_count(&server).await, 0);
}

#[tokio::test]
async fn test_missing_target_field_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(settings_for(&server));
    for channel in [Channel::Webhook, Channel::Telegram, Channel::Sms, Channel::Email] {
        let response = dispatcher
            .dispatch(&fixtures::request(
                fixtures::incident(),
                DeliveryTarget::new(channel),
            ))
            .await;
        assert!(!response.delivered);
        assert_eq!(response.detail, "Request validation failed");
        assert!(response.error.unwrap().starts_with("validation failed"));
    }

    assert_eq!(received_count(&server).await, 0);
}

#[tokio::test]
async fn test_missing_provider_configuration_fails_without_call() {
    let server = MockServer::start().await;
    let settings = Settings {
        telegram_bot_token: None,
        ..settings_for(&server)
    };

    let response = dispatcher(settings)
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::telegram("12345"),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(
        response.error.as_deref(),
        Some("provider not configured: 'telegram_bot_token' is not set")
    );
    assert_eq!(received_count(&server).await, 0);
}

#[tokio::test]
async fn test_email_goes_through_the_mailer() {
    let server = MockServer::start().await;
    let mailer = FakeMailer::default();
    let dispatcher = Dispatcher::with_mailer(
        Arc::new(settings_for(&server)),
        Arc::new(mailer.clone()),
    );

    let response = dispatcher
        .dispatch(&fixtures::request(
            fixtures::maintenance(),
            DeliveryTarget::email("ops@example.com"),
        ))
        .await;

    assert!(response.delivered, "{:?}", response);
    assert_eq!(response.detail, "Email sent to ops@example.com");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Subject: [INFO] Database upgrade"), "{}", sent[0]);
    assert!(sent[0].contains("Billing will be read-only"));
}

#[tokio::test]
async fn test_dispatch_all_preserves_request_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slack"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let requests = vec![
        fixtures::request(fixtures::incident(), DeliveryTarget::telegram("1")),
        fixtures::request(Notification::default(), DeliveryTarget::new(Channel::Sms)),
        fixtures::request(fixtures::incident(), DeliveryTarget::new(Channel::Slack)),
    ];

    let responses = dispatcher(settings_for(&server))
        .dispatch_all(&requests)
        .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].detail, "Telegram message sent to chat 1");
    assert_eq!(responses[1].detail, "Request validation failed");
    assert_eq!(responses[2].detail, "Slack webhook delivered");
    assert_eq!(received_count(&server).await, 2);
}

#[tokio::test]
async fn test_telegram_error_status_reports_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::telegram("12345"),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(response.detail, "Telegram delivery failed");
    let error = response.error.unwrap();
    assert!(error.starts_with("transport error: Telegram API returned status 403"), "{}", error);
    assert!(error.contains("bot was blocked by the user"), "{}", error);
}

#[tokio::test]
async fn test_telegram_non_json_success_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::telegram("12345"),
        ))
        .await;

    assert!(!response.delivered);
    let error = response.error.unwrap();
    assert!(error.starts_with("unexpected error: malformed Telegram response"), "{}", error);
}

#[tokio::test]
async fn test_sms_created_with_non_json_body_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .respond_with(ResponseTemplate::new(201).set_body_string("queued"))
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::sms("+33612345678"),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(response.detail, "SMS delivery failed");
    let error = response.error.unwrap();
    assert!(error.starts_with("unexpected error: malformed Twilio response"), "{}", error);
}

#[tokio::test]
async fn test_sms_created_without_sid_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "status": "queued" })))
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::sms("+33612345678"),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(
        response.error.as_deref(),
        Some("unexpected error: Twilio response has no 'sid'")
    );
}

#[tokio::test]
async fn test_webhook_timeout_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let settings = Settings {
        request_timeout_seconds: 1,
        ..settings_for(&server)
    };
    let response = dispatcher(settings)
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::webhook(format!("{}/hooks/slow", server.uri())),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(response.detail, "Webhook delivery failed");
    let error = response.error.unwrap();
    assert!(error.starts_with("transport error: request timed out"), "{}", error);
}

#[tokio::test]
async fn test_webhook_unreachable_host_is_a_transport_failure() {
    // Port 1 is reserved and never bound.
    let server = MockServer::start().await;
    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::webhook("http://127.0.0.1:1/hooks/down"),
        ))
        .await;

    assert!(!response.delivered);
    assert!(response.error.unwrap().starts_with("transport error"));
}

#[tokio::test]
async fn test_padded_chat_id_is_refused_without_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(0)
        .mount(&server)
        .await;

    let response = dispatcher(settings_for(&server))
        .dispatch(&fixtures::request(
            fixtures::incident(),
            DeliveryTarget::telegram(" 12345"),
        ))
        .await;

    assert!(!response.delivered);
    assert_eq!(response.detail, "Request validation failed");
    assert!(response.error.unwrap().contains("whitespace"));
    assert_eq!(received_count(&server).await, 0);
}
