//! Ownership of the single live capture context.
//!
//! `CaptureContextManager` is the only holder of the engine context. All
//! transitions (initialize, update, release) go through one mutex, so calls
//! from different threads are serialized independently of the main-thread
//! queue that orders view mutations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::Result;
use crate::engine::{CaptureEngine, ContextObserver, EngineContext, EngineMode};
use crate::frame_source::FrameSourceHandler;

/// Payload of `createContextFromJson`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextData {
    pub license_key: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub framework_version: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub frame_source: Option<Value>,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl ContextData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Payload of `updateContextFromJson`; every part is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextUpdate {
    #[serde(default)]
    pub settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub frame_source: Option<Value>,
}

impl ContextUpdate {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub struct CaptureContextManager {
    engine: Arc<dyn CaptureEngine>,
    frame_sources: Arc<FrameSourceHandler>,
    context: Mutex<Option<Box<dyn EngineContext>>>,
}

impl CaptureContextManager {
    pub fn new(engine: Arc<dyn CaptureEngine>, frame_sources: Arc<FrameSourceHandler>) -> Self {
        Self {
            engine,
            frame_sources,
            context: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn EngineContext>>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Builds a context from `json` and makes it the live one.
    ///
    /// A context that is already held gets replaced, not disposed; callers
    /// release it first. `listener` is attached before this returns.
    pub fn initialize(&self, json: &str, listener: Arc<dyn ContextObserver>) -> Result<()> {
        let mut slot = self.lock();

        let data = ContextData::from_json(json)?;
        let mut context = self.engine.create_context(&data)?;

        if let Some(frame_source_json) = &data.frame_source {
            let source = match self.engine.deserialize_frame_source(frame_source_json) {
                Ok(source) => source,
                Err(error) => {
                    context.dispose();
                    return Err(error.into());
                }
            };
            self.frame_sources
                .on_frame_source_deserialized(Arc::clone(&source), frame_source_json);
            context.set_frame_source(Some(source));
        }

        context.add_observer(listener);
        if slot.replace(context).is_some() {
            tracing::warn!("replaced a capture context that was never released");
        }
        tracing::info!(
            framework = data.framework.as_deref().unwrap_or("unknown"),
            "capture context initialized"
        );
        Ok(())
    }

    /// Applies settings and, if present, a new frame source.
    ///
    /// The two steps are independent: a frame source failure does not undo
    /// settings that were already applied.
    ///
    /// # Panics
    ///
    /// When no context is initialized. Updating before initializing is a
    /// caller bug, not a runtime condition.
    pub fn update(&self, json: &str) -> Result<()> {
        let mut slot = self.lock();
        let Some(context) = slot.as_mut() else {
            panic!("capture context not initialized: update called before initialize");
        };

        let update = ContextUpdate::from_json(json)?;
        if let Some(settings) = &update.settings {
            context.apply_settings(settings);
        }

        if let Some(frame_source_json) = &update.frame_source {
            let source = self.engine.deserialize_frame_source(frame_source_json)?;
            self.frame_sources
                .on_frame_source_deserialized(Arc::clone(&source), frame_source_json);
            context.set_frame_source(Some(source));
        }

        tracing::debug!("capture context updated");
        Ok(())
    }

    /// Detaches `listener`, disposes the context and returns to uninitialized.
    /// No-op when nothing is held.
    pub fn release(&self, listener: &Arc<dyn ContextObserver>) {
        let mut slot = self.lock();
        if let Some(mut context) = slot.take() {
            context.remove_observer(listener);
            context.dispose();
            tracing::info!("capture context released");
        }
    }

    /// Runs `f` against the live context, if any, under the manager lock.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut dyn EngineContext) -> R) -> Option<R> {
        let mut slot = self.lock();
        slot.as_mut().map(|context| f(context.as_mut()))
    }

    /// # Panics
    ///
    /// When no context is initialized.
    pub fn add_mode(&self, mode: Arc<dyn EngineMode>) {
        let mut slot = self.lock();
        let Some(context) = slot.as_mut() else {
            panic!("capture context not initialized: add_mode called before initialize");
        };
        context.add_mode(mode);
    }

    pub fn remove_mode(&self, mode: &Arc<dyn EngineMode>) {
        if let Some(context) = self.lock().as_mut() {
            context.remove_mode(mode);
        }
    }

    pub fn remove_all_modes(&self) {
        if let Some(context) = self.lock().as_mut() {
            context.remove_all_modes();
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/context.rs"]
mod tests;
