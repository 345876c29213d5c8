use notifyhub::core::{DeliveryTarget, Notification, NotificationRequest, Severity};

/// Builds a notification with the given alert type and extra metadata.
pub fn notification(alert_type: &str, extra: &[(&str, &str)]) -> Notification {
    let mut n = Notification {
        title: "API latency".to_string(),
        message: "p99 above 2s on checkout".to_string(),
        severity: Severity::Critical,
        ..Default::default()
    };
    n.metadata.insert("type".to_string(), alert_type.to_string());
    for (key, value) in extra {
        n.metadata.insert(key.to_string(), value.to_string());
    }
    n
}

pub fn incident() -> Notification {
    notification("incident", &[("service", "checkout")])
}

pub fn maintenance() -> Notification {
    let mut n = notification(
        "maintenance",
        &[("window", "02:00-04:00 UTC"), ("service", "billing")],
    );
    n.title = "Database upgrade".to_string();
    n.message = "Billing will be read-only".to_string();
    n.severity = Severity::Info;
    n
}

pub fn request(notification: Notification, target: DeliveryTarget) -> NotificationRequest {
    NotificationRequest {
        notification,
        target,
    }
}
