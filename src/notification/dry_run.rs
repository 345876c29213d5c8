//! The sender used while dry-run is enabled.

use super::ChannelSender;
use crate::core::{DeliveryTarget, Notification};
use crate::error::DispatchError;
use crate::formatting::RenderedBody;
use async_trait::async_trait;
use tracing::debug;

/// Reports a skipped provider call for any channel. Makes no network calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSender;

#[async_trait]
impl ChannelSender for DryRunSender {
    fn name(&self) -> &'static str {
        "Dry-run"
    }

    async fn deliver(
        &self,
        target: &DeliveryTarget,
        body: &RenderedBody,
        _notification: &Notification,
    ) -> Result<String, DispatchError> {
        let category = target.channel.category();
        debug!(channel = %target.channel, %body, "Dry-run preview");
        Ok(format!("Dry-run: {} call skipped", category))
    }
}
