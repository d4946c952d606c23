//! Fan-out of context, view, mode and overlay lifecycle events.
//!
//! Observers implement only the callbacks they care about; every callback has
//! a no-op default. Dispatch walks a snapshot of the observer list in
//! attachment order, so observers may attach or detach from inside a
//! callback. The two fallible events (`mode_add`, `overlay_add`) stop at the
//! first observer that fails and hand its error back to the caller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::engine::{EngineError, Overlay};
use crate::view::CaptureView;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid lifecycle payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{observer} rejected the event: {reason}")]
    Rejected { observer: String, reason: String },
}

pub type LifecycleResult = std::result::Result<(), LifecycleError>;

pub trait LifecycleObserver: Send + Sync {
    fn on_context_disposed(&self) {}

    fn on_view_deserialized(&self, _view: &Arc<CaptureView>) {}

    fn on_view_removed(&self, _view: &Arc<CaptureView>) {}

    fn on_mode_add(&self, _mode_json: &str) -> LifecycleResult {
        Ok(())
    }

    fn on_mode_removed(&self, _mode_json: &str) {}

    fn on_all_modes_removed(&self) {}

    fn on_overlay_add(&self, _overlay_json: &str, _view: &CaptureView) -> LifecycleResult {
        Ok(())
    }

    fn on_overlay_removed(&self, _overlay: &Arc<dyn Overlay>) {}
}

#[derive(Default)]
pub struct ObserverDispatcher {
    observers: Mutex<Vec<Arc<dyn LifecycleObserver>>>,
}

impl ObserverDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn LifecycleObserver>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<Arc<dyn LifecycleObserver>> {
        self.lock().clone()
    }

    /// Returns `false` if `observer` was already attached.
    pub fn attach(&self, observer: Arc<dyn LifecycleObserver>) -> bool {
        let mut observers = self.lock();
        if observers.iter().any(|held| Arc::ptr_eq(held, &observer)) {
            return false;
        }
        observers.push(observer);
        tracing::debug!(observers = observers.len(), "lifecycle observer attached");
        true
    }

    /// Returns `false` if `observer` was not attached.
    pub fn detach(&self, observer: &Arc<dyn LifecycleObserver>) -> bool {
        let mut observers = self.lock();
        let Some(index) = observers.iter().position(|held| Arc::ptr_eq(held, observer)) else {
            return false;
        };
        observers.remove(index);
        tracing::debug!(observers = observers.len(), "lifecycle observer detached");
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dispatch_context_disposed(&self) {
        for observer in self.snapshot() {
            observer.on_context_disposed();
        }
    }

    pub fn dispatch_view_deserialized(&self, view: &Arc<CaptureView>) {
        for observer in self.snapshot() {
            observer.on_view_deserialized(view);
        }
    }

    pub fn dispatch_view_removed(&self, view: &Arc<CaptureView>) {
        for observer in self.snapshot() {
            observer.on_view_removed(view);
        }
    }

    pub fn dispatch_mode_add(&self, mode_json: &str) -> LifecycleResult {
        for observer in self.snapshot() {
            if let Err(error) = observer.on_mode_add(mode_json) {
                tracing::warn!(%error, "mode add rejected by observer");
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn dispatch_mode_removed(&self, mode_json: &str) {
        for observer in self.snapshot() {
            observer.on_mode_removed(mode_json);
        }
    }

    pub fn dispatch_all_modes_removed(&self) {
        for observer in self.snapshot() {
            observer.on_all_modes_removed();
        }
    }

    pub fn dispatch_overlay_add(&self, overlay_json: &str, view: &CaptureView) -> LifecycleResult {
        for observer in self.snapshot() {
            if let Err(error) = observer.on_overlay_add(overlay_json, view) {
                tracing::warn!(view_id = view.view_id(), %error, "overlay add rejected by observer");
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn dispatch_overlay_removed(&self, overlay: &Arc<dyn Overlay>) {
        for observer in self.snapshot() {
            observer.on_overlay_removed(overlay);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/lifecycle.rs"]
mod tests;
