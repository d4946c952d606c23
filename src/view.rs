//! Bridge-side wrapper around an engine view.
//!
//! A `CaptureView` owns the engine view, the overlays attached to it and its
//! size listener. Views are created and mutated on the main thread only; the
//! inner mutex exists so the wrapper can be shared through the registry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::core::{CoreError, Disposable, Result};
use crate::engine::{
    CaptureEngine, EngineContext, EngineView, Overlay, Point, Quadrilateral, ViewObserver,
};
use crate::event::Emitter;
use crate::lifecycle::ObserverDispatcher;
use crate::listener::ViewListener;

const VIEW_ID_KEY: &str = "viewId";
const PARENT_ID_KEY: &str = "parentId";
const OVERLAYS_KEY: &str = "overlays";

/// A view payload split into the view itself and its overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCreationData {
    pub view_id: i64,
    pub parent_id: Option<i64>,
    /// The payload without the `overlays` key.
    pub view_json: Value,
    /// One encoded JSON object per overlay, in payload order.
    pub overlays: Vec<String>,
}

impl ViewCreationData {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut root: Value = serde_json::from_str(json)?;
        let Some(object) = root.as_object_mut() else {
            return Err(CoreError::invalid_json(json));
        };

        let overlays = match object.remove(OVERLAYS_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| item.is_object())
                .map(Value::to_string)
                .collect(),
            _ => Vec::new(),
        };
        let view_id = object.get(VIEW_ID_KEY).and_then(Value::as_i64).unwrap_or(0);
        let parent_id = object.get(PARENT_ID_KEY).and_then(Value::as_i64);

        Ok(Self {
            view_id,
            parent_id,
            view_json: root,
            overlays,
        })
    }
}

struct ViewState {
    engine_view: Option<Box<dyn EngineView>>,
    overlays: Vec<Arc<dyn Overlay>>,
    listener: Option<Arc<ViewListener>>,
}

pub struct CaptureView {
    view_id: i64,
    parent_id: Option<i64>,
    dispatcher: Arc<ObserverDispatcher>,
    state: Mutex<ViewState>,
}

impl CaptureView {
    /// Deserializes the engine view and hooks up its size listener, which
    /// starts out enabled.
    pub fn create(
        engine: &dyn CaptureEngine,
        context: &mut dyn EngineContext,
        data: &ViewCreationData,
        emitter: Arc<dyn Emitter>,
        dispatcher: Arc<ObserverDispatcher>,
    ) -> Result<Self> {
        let mut engine_view = engine.deserialize_view(context, &data.view_json)?;
        let listener = Arc::new(ViewListener::new(data.view_id, emitter));
        engine_view.add_observer(listener.clone());

        Ok(Self {
            view_id: data.view_id,
            parent_id: data.parent_id,
            dispatcher,
            state: Mutex::new(ViewState {
                engine_view: Some(engine_view),
                overlays: Vec::new(),
                listener: Some(listener),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn view_id(&self) -> i64 {
        self.view_id
    }

    pub fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().engine_view.is_none()
    }

    pub fn add_overlay(&self, overlay: Arc<dyn Overlay>) {
        let mut state = self.lock();
        if let Some(engine_view) = state.engine_view.as_mut() {
            engine_view.add_overlay(Arc::clone(&overlay));
        }
        state.overlays.push(overlay);
    }

    /// Returns `false` if `overlay` is not attached to this view.
    pub fn remove_overlay(&self, overlay: &Arc<dyn Overlay>) -> bool {
        {
            let mut state = self.lock();
            let Some(index) = state
                .overlays
                .iter()
                .position(|held| Arc::ptr_eq(held, overlay))
            else {
                return false;
            };
            state.overlays.remove(index);
            if let Some(engine_view) = state.engine_view.as_mut() {
                engine_view.remove_overlay(overlay);
            }
        }
        self.dispatcher.dispatch_overlay_removed(overlay);
        true
    }

    pub fn remove_all_overlays(&self) {
        for overlay in self.overlays() {
            self.remove_overlay(&overlay);
        }
    }

    /// Attached overlays in attachment order.
    pub fn overlays(&self) -> Vec<Arc<dyn Overlay>> {
        self.lock().overlays.clone()
    }

    pub fn find_overlay(&self, overlay_type: &str) -> Option<Arc<dyn Overlay>> {
        self.lock()
            .overlays
            .iter()
            .find(|overlay| overlay.overlay_type() == overlay_type)
            .cloned()
    }

    pub fn enable_listener(&self) {
        if let Some(listener) = self.lock().listener.as_ref() {
            listener.enable();
        }
    }

    pub fn disable_listener(&self) {
        if let Some(listener) = self.lock().listener.as_ref() {
            listener.disable();
        }
    }

    pub fn is_listener_enabled(&self) -> bool {
        self.lock()
            .listener
            .as_ref()
            .is_some_and(|listener| listener.is_enabled())
    }

    /// Applies a view payload (without overlays) to the engine view.
    pub fn update(&self, json: &Value) -> Result<()> {
        let mut state = self.lock();
        match state.engine_view.as_mut() {
            Some(engine_view) => Ok(engine_view.update(json)?),
            None => Err(CoreError::NilDataCaptureView),
        }
    }

    pub fn view_point_for_frame_point(&self, point: Point) -> Option<Point> {
        self.lock()
            .engine_view
            .as_ref()
            .map(|view| view.view_point_for_frame_point(point))
    }

    pub fn view_quadrilateral_for_frame_quadrilateral(
        &self,
        quad: Quadrilateral,
    ) -> Option<Quadrilateral> {
        self.lock()
            .engine_view
            .as_ref()
            .map(|view| view.view_quadrilateral_for_frame_quadrilateral(quad))
    }
}

impl Disposable for CaptureView {
    /// Removes every overlay, detaches the listener and takes the view off
    /// its parent. Later calls are no-ops.
    fn dispose(&self) {
        self.remove_all_overlays();

        let mut state = self.lock();
        let listener = state.listener.take();
        let Some(mut engine_view) = state.engine_view.take() else {
            return;
        };
        if let Some(listener) = listener {
            let observer: Arc<dyn ViewObserver> = listener;
            engine_view.remove_observer(&observer);
        }
        engine_view.remove_from_parent();
        tracing::debug!(view_id = self.view_id, "view disposed");
    }
}

#[cfg(test)]
#[path = "../tests/unit/view.rs"]
mod tests;
