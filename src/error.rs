//! Error taxonomy for dispatching.
//!
//! None of these escape `Dispatcher::dispatch`; they are folded into a
//! failed `DispatchResponse` at the sender or dispatcher boundary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The request is malformed or lacks a field its channel needs.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A provider credential or endpoint is missing from the settings.
    #[error("provider not configured: {0}")]
    Configuration(String),

    /// Network failure, timeout, or non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider accepted the call but reported a logical failure.
    #[error("provider rejected the request: {0}")]
    Provider(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Provider URLs carry credentials (bot tokens, account ids, webhook
/// secrets), so the URL is stripped before the error is rendered.
impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            DispatchError::Transport(format!("request timed out: {}", err))
        } else {
            DispatchError::Transport(err.to_string())
        }
    }
}
