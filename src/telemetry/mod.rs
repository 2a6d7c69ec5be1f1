//! Telemetry sinks
//!
//! A catalog owns one client and hands it to every dialog it registers, so the
//! engine and all dialogs report into the same sink.

use tracing::debug;

use crate::events::{DialogEvent, StackEvent};

/// Receives lifecycle events
pub trait TelemetryClient: Send + Sync {
    fn track_event(&self, event: &DialogEvent);

    /// Push out anything buffered
    fn flush(&self) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetryClient;

impl TelemetryClient for NullTelemetryClient {
    fn track_event(&self, _event: &DialogEvent) {}
}

/// Forwards events to `tracing` at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetryClient;

impl TelemetryClient for TracingTelemetryClient {
    fn track_event(&self, event: &DialogEvent) {
        let payload = serde_json::to_string(event).unwrap_or_default();
        debug!(
            subject = %event.subject(),
            dialog_id = event.dialog_id(),
            "{payload}"
        );
    }
}
