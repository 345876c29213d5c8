//! Email sender using SMTP.

use super::{required_setting, target_field, ChannelSender};
use crate::config::Settings;
use crate::core::{DeliveryTarget, Notification};
use crate::error::DispatchError;
use crate::formatting::RenderedBody;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// A transport able to hand a finished message to a mail server.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), DispatchError>;
}

/// Delivers through an SMTP relay. A fresh connection is opened per message.
pub struct SmtpMailer {
    host: String,
    port: u16,
    starttls: bool,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>, port: u16, starttls: bool, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            starttls,
            credentials: None,
            timeout,
        }
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.credentials = Some((username, password));
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mailer = Self::new(
            settings.smtp_host.clone(),
            settings.smtp_port,
            settings.smtp_starttls,
            settings.request_timeout(),
        );
        match (&settings.smtp_username, &settings.smtp_password) {
            (Some(username), Some(password)) => {
                mailer.with_credentials(username.clone(), password.clone())
            }
            _ => mailer,
        }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DispatchError> {
        let builder = if self.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host).map_err(
                |e: lettre::transport::smtp::Error| {
                    DispatchError::Transport(format!("SMTP relay setup failed: {}", e))
                },
            )?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
        };

        let mut builder = builder.port(self.port).timeout(Some(self.timeout));
        if let Some((username, password)) = &self.credentials {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), DispatchError> {
        let transport = self.transport()?;
        transport
            .send(message)
            .await
            .map_err(|e: lettre::transport::smtp::Error| {
                DispatchError::Transport(format!("SMTP delivery failed: {}", e))
            })?;
        Ok(())
    }
}

/// Builds plain-text messages from `smtp_sender` and hands them to a `Mailer`.
pub struct EmailSender {
    settings: Arc<Settings>,
    mailer: Arc<dyn Mailer>,
}

impl EmailSender {
    pub fn new(settings: Arc<Settings>, mailer: Arc<dyn Mailer>) -> Self {
        Self { settings, mailer }
    }

    fn subject(notification: &Notification) -> String {
        format!(
            "[{}] {}",
            notification.severity.as_str().to_ascii_uppercase(),
            notification.title
        )
    }

    fn build_message(
        &self,
        to: &str,
        body: &RenderedBody,
        notification: &Notification,
    ) -> Result<Message, DispatchError> {
        let from = required_setting(&self.settings.smtp_sender, "smtp_sender")?;
        let from: Mailbox = from.parse().map_err(|e: lettre::address::AddressError| {
            DispatchError::Configuration(format!("invalid smtp_sender '{}': {}", from, e))
        })?;
        let to: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            DispatchError::Validation(format!("invalid recipient address '{}': {}", to, e))
        })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(Self::subject(notification))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DispatchError::Unexpected(format!("failed to build email: {}", e)))
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn name(&self) -> &'static str {
        "Email"
    }

    #[instrument(skip_all)]
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        body: &RenderedBody,
        notification: &Notification,
    ) -> Result<String, DispatchError> {
        let to = target_field(&target.email_to, "email_to")?;
        let message = self.build_message(to, body, notification)?;

        debug!(to, "Handing email to the mail transport");
        self.mailer.send(message).await?;
        Ok(format!("Email sent to {}", to))
    }
}
