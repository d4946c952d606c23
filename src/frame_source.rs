//! Tracks the frame source the live context is using.
//!
//! Only one source is active at a time. The frame-source listener follows it:
//! it is detached from the previous source and attached to the new one on
//! every swap.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::engine::{
    CameraPosition, FrameSource, FrameSourceKind, FrameSourceObserver, FrameSourceState,
    SwitchCompletion, TorchState,
};
use crate::listener::FrameSourceListener;

const DESIRED_STATE_KEY: &str = "desiredState";
const DESIRED_TORCH_STATE_KEY: &str = "desiredTorchState";

pub struct FrameSourceHandler {
    listener: Arc<FrameSourceListener>,
    observer: Arc<dyn FrameSourceObserver>,
    active: Mutex<Option<Arc<dyn FrameSource>>>,
}

impl FrameSourceHandler {
    pub fn new(listener: Arc<FrameSourceListener>) -> Self {
        let observer: Arc<dyn FrameSourceObserver> = listener.clone();
        Self {
            listener,
            observer,
            active: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<dyn FrameSource>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn listener(&self) -> &Arc<FrameSourceListener> {
        &self.listener
    }

    /// Makes `source` the active one and applies the desired states that
    /// came along in its JSON.
    pub fn on_frame_source_deserialized(&self, source: Arc<dyn FrameSource>, json: &Value) {
        let previous = self.lock().replace(Arc::clone(&source));
        if let Some(previous) = previous {
            previous.remove_observer(&self.observer);
        }
        source.add_observer(Arc::clone(&self.observer));

        if source.kind() == FrameSourceKind::Camera {
            if let Some(torch) = json.get(DESIRED_TORCH_STATE_KEY) {
                let torch = torch.as_str().map(TorchState::from_arg).unwrap_or_default();
                source.set_desired_torch_state(torch);
            }
        }
        if let Some(state) = json.get(DESIRED_STATE_KEY) {
            let state = state
                .as_str()
                .map(FrameSourceState::from_arg)
                .unwrap_or_default();
            source.switch_to_desired_state(state, None);
        }
        tracing::debug!(kind = ?source.kind(), "frame source attached");
    }

    /// Completes with `true` right away when there is no source to switch.
    pub fn switch_to_state(&self, state: FrameSourceState, done: SwitchCompletion) {
        let active = self.lock().clone();
        match active {
            Some(source) => source.switch_to_desired_state(state, Some(done)),
            None => done(true),
        }
    }

    fn camera(&self) -> Option<Arc<dyn FrameSource>> {
        self.lock()
            .as_ref()
            .filter(|source| source.kind() == FrameSourceKind::Camera)
            .cloned()
    }

    fn camera_at(&self, position: &str) -> Option<Arc<dyn FrameSource>> {
        let position = CameraPosition::from_arg(position);
        self.camera().filter(|camera| camera.position() == position)
    }

    pub fn has_camera(&self) -> bool {
        self.camera().is_some()
    }

    pub fn camera_position(&self) -> Option<CameraPosition> {
        self.camera().map(|camera| camera.position())
    }

    /// `None` unless the active camera sits at `position`.
    pub fn camera_state_by_position(&self, position: &str) -> Option<FrameSourceState> {
        self.camera_at(position).map(|camera| camera.current_state())
    }

    pub fn is_torch_available_by_position(&self, position: &str) -> Option<bool> {
        self.camera_at(position)
            .map(|camera| camera.is_torch_available())
    }

    pub fn current_camera_state(&self) -> Option<FrameSourceState> {
        self.camera().map(|camera| camera.current_state())
    }

    pub fn current_camera_desired_state(&self) -> Option<FrameSourceState> {
        self.camera().map(|camera| camera.desired_state())
    }

    /// Turns the camera off and forgets whatever source was active.
    pub fn release_camera(&self) {
        let Some(source) = self.lock().take() else {
            return;
        };
        if source.kind() == FrameSourceKind::Camera {
            source.switch_to_desired_state(FrameSourceState::Off, None);
        }
        source.remove_observer(&self.observer);
        tracing::debug!("frame source released");
    }
}

#[cfg(test)]
#[path = "../tests/unit/frame_source.rs"]
mod tests;
