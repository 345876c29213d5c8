//! The single entry point for sending notifications.
//!
//! `Dispatcher::dispatch` validates a request, renders the body, resolves the
//! sender for the requested channel and returns a `DispatchResponse`. It never
//! returns an error and never panics past its boundary: every failure,
//! including a panic inside a sender, becomes `delivered: false`.

use crate::config::Settings;
use crate::core::{DispatchResponse, NotificationRequest};
use crate::error::DispatchError;
use crate::formatting::TemplateRenderer;
use crate::internal_metrics;
use crate::notification::{Mailer, SenderRegistry};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, instrument, warn};

/// Stateless orchestrator over immutable `Settings`. Safe to share across tasks.
pub struct Dispatcher {
    settings: Arc<Settings>,
    renderer: TemplateRenderer,
    senders: SenderRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher delivering e-mail over SMTP.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            senders: SenderRegistry::new(settings.clone()),
            settings,
            renderer: TemplateRenderer,
        }
    }

    /// Creates a dispatcher with a custom mail transport.
    pub fn with_mailer(settings: Arc<Settings>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            senders: SenderRegistry::with_mailer(settings.clone(), mailer),
            settings,
            renderer: TemplateRenderer,
        }
    }

    /// Dispatches one request. At most one outbound call is made.
    #[instrument(skip_all, fields(channel = %request.target.channel, dry_run = self.settings.dry_run))]
    pub async fn dispatch(&self, request: &NotificationRequest) -> DispatchResponse {
        let started = Instant::now();
        let channel = request.target.channel;

        let response = match AssertUnwindSafe(self.dispatch_inner(request))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(panic) => {
                let err = DispatchError::Unexpected(panic_message(panic.as_ref()));
                error!(error = %err, "Dispatch panicked");
                DispatchResponse::failed(format!("{} dispatch failed", channel), &err)
            }
        };

        internal_metrics::record_dispatch(channel, response.delivered, started.elapsed());
        response
    }

    /// Dispatches several requests concurrently.
    ///
    /// Responses are returned in request order; completion order is unspecified.
    pub async fn dispatch_all(&self, requests: &[NotificationRequest]) -> Vec<DispatchResponse> {
        join_all(requests.iter().map(|request| self.dispatch(request))).await
    }

    async fn dispatch_inner(&self, request: &NotificationRequest) -> DispatchResponse {
        let target = &request.target;
        if let Err(e) = target.validate() {
            warn!(error = %e, "Rejecting invalid request");
            return DispatchResponse::failed("Request validation failed", &e);
        }

        let body = self.renderer.render(target.channel, &request.notification);

        let sender = if self.settings.dry_run {
            self.senders.dry_run()
        } else {
            self.senders.for_channel(target.channel)
        };
        sender.send(target, &body, &request.notification).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "sender panicked".to_string()
    }
}
