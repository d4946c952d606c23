//! A mode module driven entirely by lifecycle events.
//!
//! It deserializes the modes and overlays whose `type` it handles, attaches
//! modes to the live context and keeps them in a [`ModeCache`]. An empty
//! type list means "handle every type"; two modules that both handle a type
//! will both act on it.

use std::sync::{Arc, Weak};

use serde::Deserialize;
use serde_json::{json, Value};

use super::{FrameworkModule, FrameworksMode, ModeCache};
use crate::command::Command;
use crate::context::CaptureContextManager;
use crate::core::Disposable;
use crate::engine::{CaptureEngine, EngineError, EngineMode};
use crate::lifecycle::{LifecycleError, LifecycleObserver, LifecycleResult, ObserverDispatcher};
use crate::method::MethodCall;
use crate::view::CaptureView;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModePayload {
    #[serde(rename = "type")]
    mode_type: String,
    #[serde(default)]
    mode_id: i64,
    #[serde(default)]
    parent_id: Option<i64>,
}

pub struct GenericMode {
    mode_id: i64,
    parent_id: Option<i64>,
    mode_type: String,
    engine_mode: Arc<dyn EngineMode>,
    contexts: Arc<CaptureContextManager>,
}

impl GenericMode {
    pub fn mode_type(&self) -> &str {
        &self.mode_type
    }

    pub fn engine_mode(&self) -> &Arc<dyn EngineMode> {
        &self.engine_mode
    }
}

impl Disposable for GenericMode {
    fn dispose(&self) {
        self.contexts.remove_mode(&self.engine_mode);
    }
}

impl FrameworksMode for GenericMode {
    fn mode_id(&self) -> i64 {
        self.mode_id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }
}

pub struct GenericModeModule {
    name: &'static str,
    engine: Arc<dyn CaptureEngine>,
    contexts: Arc<CaptureContextManager>,
    dispatcher: Arc<ObserverDispatcher>,
    mode_types: Vec<String>,
    overlay_types: Vec<String>,
    modes: ModeCache<GenericMode>,
    this: Weak<Self>,
}

impl GenericModeModule {
    pub fn new(
        name: &'static str,
        engine: Arc<dyn CaptureEngine>,
        contexts: Arc<CaptureContextManager>,
        dispatcher: Arc<ObserverDispatcher>,
        mode_types: &[&str],
        overlay_types: &[&str],
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            name,
            engine,
            contexts,
            dispatcher,
            mode_types: mode_types.iter().map(|t| t.to_string()).collect(),
            overlay_types: overlay_types.iter().map(|t| t.to_string()).collect(),
            modes: ModeCache::new(),
            this: this.clone(),
        })
    }

    pub fn modes(&self) -> &ModeCache<GenericMode> {
        &self.modes
    }

    fn handles(types: &[String], candidate: &str) -> bool {
        types.is_empty() || types.iter().any(|t| t == candidate)
    }

    fn observer(&self) -> Option<Arc<dyn LifecycleObserver>> {
        let this: Arc<dyn LifecycleObserver> = self.this.upgrade()?;
        Some(this)
    }

    fn reject(&self, reason: impl Into<String>) -> LifecycleError {
        LifecycleError::Rejected {
            observer: self.name.to_string(),
            reason: reason.into(),
        }
    }

    fn clear(&self) {
        self.modes.remove_all();
        self.modes.clear_pending(None);
    }

    fn run_pending(&self, mode_id: i64, parent_id: Option<i64>) {
        let mut actions = self.modes.take_pending_actions(mode_id);
        if let Some(parent_id) = parent_id {
            actions.extend(self.modes.take_pending_actions_by_parent(parent_id));
        }
        for action in actions {
            action();
        }
    }
}

impl LifecycleObserver for GenericModeModule {
    fn on_context_disposed(&self) {
        self.clear();
    }

    fn on_mode_add(&self, mode_json: &str) -> LifecycleResult {
        let value: Value = serde_json::from_str(mode_json)?;
        let payload: ModePayload = serde_json::from_value(value.clone())?;
        if !Self::handles(&self.mode_types, &payload.mode_type) {
            return Ok(());
        }
        if !self.contexts.is_initialized() {
            return Err(self.reject("no capture context to add the mode to"));
        }

        let engine_mode = self.engine.deserialize_mode(&value)?;
        self.contexts.add_mode(Arc::clone(&engine_mode));
        let mode = Arc::new(GenericMode {
            mode_id: payload.mode_id,
            parent_id: payload.parent_id,
            mode_type: payload.mode_type,
            engine_mode,
            contexts: Arc::clone(&self.contexts),
        });
        if let Some(replaced) = self.modes.add(Arc::clone(&mode)) {
            replaced.dispose();
        }
        tracing::info!(
            module = self.name,
            mode_id = mode.mode_id,
            mode_type = %mode.mode_type,
            "mode added"
        );

        self.run_pending(mode.mode_id, mode.parent_id);
        Ok(())
    }

    fn on_mode_removed(&self, mode_json: &str) {
        let payload = match serde_json::from_str::<ModePayload>(mode_json) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(module = self.name, %error, "ignoring unreadable mode removal");
                return;
            }
        };
        if !Self::handles(&self.mode_types, &payload.mode_type) {
            return;
        }
        if let Some(mode) = self.modes.remove(payload.mode_id) {
            mode.dispose();
            tracing::info!(module = self.name, mode_id = payload.mode_id, "mode removed");
        }
        self.modes.clear_pending(Some(payload.mode_id));
    }

    fn on_all_modes_removed(&self) {
        self.clear();
    }

    fn on_overlay_add(&self, overlay_json: &str, view: &CaptureView) -> LifecycleResult {
        let value: Value = serde_json::from_str(overlay_json)?;
        let overlay_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EngineError::MissingField("type"))?;
        if !Self::handles(&self.overlay_types, overlay_type) {
            return Ok(());
        }

        let overlay = self.engine.deserialize_overlay(&value)?;
        view.add_overlay(overlay);
        tracing::debug!(
            module = self.name,
            view_id = view.view_id(),
            overlay_type,
            "overlay added"
        );
        Ok(())
    }
}

impl FrameworkModule for GenericModeModule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn did_start(&self) {
        if let Some(observer) = self.observer() {
            self.dispatcher.attach(observer);
        }
    }

    fn did_stop(&self) {
        if let Some(observer) = self.observer() {
            self.dispatcher.detach(&observer);
        }
        self.clear();
    }

    /// Modes are driven by lifecycle events only.
    fn create_command(&self, _call: &dyn MethodCall) -> Option<Box<dyn Command>> {
        None
    }

    fn defaults(&self) -> Value {
        json!({
            "modeTypes": self.mode_types,
            "overlayTypes": self.overlay_types,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/module/generic.rs"]
mod tests;
