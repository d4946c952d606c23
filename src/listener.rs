//! Engine observers that forward callbacks to the [`Emitter`].
//!
//! Each listener is attached to the engine for the lifetime of the object it
//! observes; whether anything is emitted is decided per callback by its
//! [`AtomicFlag`] and by the emitter having a registered client.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::core::AtomicFlag;
use crate::engine::{
    CameraPosition, ContextObserver, FrameSourceObserver, FrameSourceState, Size, TorchState,
    ViewObserver,
};
use crate::event::{
    Emitter, CONTEXT_OBSERVATION_STARTED, CONTEXT_STATUS_CHANGED, FRAME_SOURCE_STATE_CHANGED,
    TORCH_STATE_CHANGED, VIEW_SIZE_CHANGED,
};

pub struct FrameSourceListener {
    emitter: Arc<dyn Emitter>,
    enabled: AtomicFlag,
}

impl FrameSourceListener {
    pub fn new(emitter: Arc<dyn Emitter>) -> Self {
        Self {
            emitter,
            enabled: AtomicFlag::new(false),
        }
    }

    pub fn enable(&self) {
        self.enabled.enable();
    }

    pub fn disable(&self) {
        self.enabled.disable();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn should_emit(&self, event: &str) -> bool {
        self.enabled.get() && self.emitter.has_listener(event)
    }
}

impl FrameSourceObserver for FrameSourceListener {
    fn on_state_changed(&self, state: FrameSourceState, position: Option<CameraPosition>) {
        if !self.should_emit(FRAME_SOURCE_STATE_CHANGED) {
            return;
        }
        let mut payload = json!({ "state": state.as_str() });
        if let Some(position) = position {
            payload["cameraPosition"] = Value::from(position.as_str());
        }
        self.emitter.emit(FRAME_SOURCE_STATE_CHANGED, payload);
    }

    fn on_torch_state_changed(&self, state: TorchState) {
        if !self.should_emit(TORCH_STATE_CHANGED) {
            return;
        }
        self.emitter
            .emit(TORCH_STATE_CHANGED, json!({ "state": state.as_str() }));
    }
}

pub struct ContextListener {
    emitter: Arc<dyn Emitter>,
    enabled: AtomicFlag,
}

impl ContextListener {
    pub fn new(emitter: Arc<dyn Emitter>) -> Self {
        Self {
            emitter,
            enabled: AtomicFlag::new(false),
        }
    }

    pub fn enable(&self) {
        self.enabled.enable();
    }

    pub fn disable(&self) {
        self.enabled.disable();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn should_emit(&self, event: &str) -> bool {
        self.enabled.get() && self.emitter.has_listener(event)
    }
}

impl ContextObserver for ContextListener {
    fn on_observation_started(&self) {
        if self.should_emit(CONTEXT_OBSERVATION_STARTED) {
            self.emitter.emit(CONTEXT_OBSERVATION_STARTED, json!({}));
        }
    }

    fn on_status_changed(&self, status: &Value) {
        if self.should_emit(CONTEXT_STATUS_CHANGED) {
            self.emitter
                .emit(CONTEXT_STATUS_CHANGED, json!({ "status": status }));
        }
    }
}

/// Size-change listener bound to one view. Starts enabled; the client can
/// switch it off per view.
pub struct ViewListener {
    view_id: i64,
    emitter: Arc<dyn Emitter>,
    enabled: AtomicFlag,
}

impl ViewListener {
    pub fn new(view_id: i64, emitter: Arc<dyn Emitter>) -> Self {
        Self {
            view_id,
            emitter,
            enabled: AtomicFlag::new(true),
        }
    }

    pub fn view_id(&self) -> i64 {
        self.view_id
    }

    pub fn enable(&self) {
        self.enabled.enable();
    }

    pub fn disable(&self) {
        self.enabled.disable();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl ViewObserver for ViewListener {
    fn on_size_changed(&self, size: Size, orientation: &str) {
        if !self.enabled.get()
            || !self
                .emitter
                .has_view_specific_listeners(self.view_id, VIEW_SIZE_CHANGED)
        {
            return;
        }
        self.emitter.emit(
            VIEW_SIZE_CHANGED,
            json!({
                "viewId": self.view_id,
                "size": { "width": size.width, "height": size.height },
                "orientation": orientation,
            }),
        );
    }
}

#[cfg(test)]
#[path = "../tests/unit/listener.rs"]
mod tests;
