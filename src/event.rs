//! Outbound events and the sink they are written to.

use serde_json::Value;

pub const FRAME_SOURCE_STATE_CHANGED: &str = "FrameSourceListener.onStateChanged";
pub const TORCH_STATE_CHANGED: &str = "TorchListener.onTorchStateChanged";
pub const CONTEXT_OBSERVATION_STARTED: &str = "DataCaptureContextListener.onObservationStarted";
pub const CONTEXT_STATUS_CHANGED: &str = "DataCaptureContextListener.onStatusChanged";
pub const VIEW_SIZE_CHANGED: &str = "DataCaptureViewListener.onSizeChanged";

pub const FRAME_SOURCE_EVENTS: &[&str] = &[FRAME_SOURCE_STATE_CHANGED, TORCH_STATE_CHANGED];
pub const CONTEXT_EVENTS: &[&str] = &[CONTEXT_OBSERVATION_STARTED, CONTEXT_STATUS_CHANGED];
pub const VIEW_EVENTS: &[&str] = &[VIEW_SIZE_CHANGED];

/// Transport-side event sink. Engine callbacks arrive on arbitrary threads.
pub trait Emitter: Send + Sync {
    fn emit(&self, name: &str, payload: Value);

    fn has_listener(&self, name: &str) -> bool;

    fn has_view_specific_listeners(&self, _view_id: i64, name: &str) -> bool {
        self.has_listener(name)
    }

    fn has_mode_specific_listeners(&self, _mode_id: i64, name: &str) -> bool {
        self.has_listener(name)
    }
}
