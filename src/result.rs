//! Where command outcomes go.
//!
//! Every command ends in exactly one `success` or `reject` on the sink it was
//! executed with. The event-registration calls are bookkeeping for transports
//! that keep a callback channel open; the defaults ignore them.

use serde_json::{json, Value};

use crate::core::CoreError;

pub trait ResultSink: Send + Sync {
    fn success(&self, value: Value);

    fn reject(&self, code: &str, message: &str, details: Option<Value>);

    /// Success that leaves the callback channel open for later events.
    fn success_and_keep_callback(&self, value: Value) {
        self.success(value);
    }

    fn register_callback_for_events(&self, _names: &[&str]) {}

    fn unregister_callback_for_events(&self, _names: &[&str]) {}

    fn register_mode_specific_callback(&self, _mode_id: i64, names: &[&str]) {
        self.register_callback_for_events(names);
    }

    fn unregister_mode_specific_callback(&self, _mode_id: i64, names: &[&str]) {
        self.unregister_callback_for_events(names);
    }

    fn register_view_specific_callback(&self, _view_id: i64, names: &[&str]) {
        self.register_callback_for_events(names);
    }

    fn unregister_view_specific_callback(&self, _view_id: i64, names: &[&str]) {
        self.unregister_callback_for_events(names);
    }

    fn reject_error(&self, error: &CoreError) {
        self.reject(
            error.code(),
            &error.to_string(),
            Some(json!({ "errorCode": error.error_code() })),
        );
    }
}

/// Discards everything. Used for fire-and-forget internal calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResult;

impl ResultSink for NoopResult {
    fn success(&self, _value: Value) {}

    fn reject(&self, _code: &str, _message: &str, _details: Option<Value>) {}
}

#[cfg(test)]
#[path = "../tests/unit/result.rs"]
mod tests;
