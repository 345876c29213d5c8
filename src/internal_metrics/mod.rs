//! # Internal Metrics Module
//!
//! Dispatch outcomes are recorded through the `metrics` facade. Nothing is
//! exported over the network; when `log_metrics` is enabled the binary installs
//! the [`LoggingRecorder`], which writes periodic snapshots to the log.
//! Without an installed recorder every call here is a no-op.

pub mod logging_recorder;

pub use logging_recorder::LoggingRecorder;

use crate::core::Channel;
use metrics::Unit;
use std::time::Duration;

pub const DISPATCHED_TOTAL: &str = "notifications_dispatched_total";
pub const DISPATCH_DURATION: &str = "dispatch_duration_seconds";

/// Registers descriptions for all supported metrics with the global recorder.
pub fn describe_metrics() {
    metrics::describe_counter!(
        DISPATCHED_TOTAL,
        Unit::Count,
        "Total number of dispatched notifications, labeled by channel and outcome."
    );
    metrics::describe_histogram!(
        DISPATCH_DURATION,
        Unit::Seconds,
        "Time taken to validate, render and deliver a notification."
    );
}

/// Records one finished dispatch.
pub fn record_dispatch(channel: Channel, delivered: bool, elapsed: Duration) {
    let outcome = if delivered { "delivered" } else { "failed" };
    metrics::counter!(DISPATCHED_TOTAL, "channel" => channel.as_str(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!(DISPATCH_DURATION, "channel" => channel.as_str())
        .record(elapsed.as_secs_f64());
}
