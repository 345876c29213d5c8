/// notifyhub - A multi-channel notification dispatch engine
///
/// This library renders notifications into channel-specific bodies and
/// delivers them to webhooks, Slack, e-mail, Telegram or SMS, reporting a
/// uniform `DispatchResponse` for every request.
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod error;
pub mod formatting;
pub mod internal_metrics;
pub mod notification;

// Re-export core types for convenience
pub use crate::config::Settings;
pub use crate::core::*;
pub use crate::dispatcher::Dispatcher;
pub use crate::error::DispatchError;
pub use crate::formatting::{RenderedBody, TemplateRenderer};
