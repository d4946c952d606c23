//! Last-frame cache.
//!
//! Modes hand frames to the cache when they report results; clients fetch
//! them afterwards by id. Frames live in memory only and are dropped when
//! the context is disposed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::config::FramesHandlingConfiguration;

#[derive(Default)]
struct FrameState {
    frames: FxHashMap<String, Value>,
    configuration: FramesHandlingConfiguration,
}

#[derive(Default)]
pub struct FrameCache {
    next_id: AtomicU64,
    state: Mutex<FrameState>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn configure(&self, configuration: FramesHandlingConfiguration) {
        self.lock().configuration = configuration;
    }

    pub fn configuration(&self) -> FramesHandlingConfiguration {
        self.lock().configuration.clone()
    }

    /// Stores `frame` under a fresh id and returns the id.
    pub fn add(&self, frame: Value) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        self.insert(id.clone(), frame);
        id
    }

    /// Stores `frame` under an id chosen by the caller, replacing any frame
    /// already cached there.
    pub fn insert(&self, id: impl Into<String>, frame: Value) {
        self.lock().frames.insert(id.into(), frame);
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.lock().frames.get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Value> {
        self.lock().frames.remove(id)
    }

    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached frame. Ids are never reused.
    pub fn release(&self) {
        let mut state = self.lock();
        if !state.frames.is_empty() {
            tracing::debug!(count = state.frames.len(), "releasing cached frames");
        }
        state.frames.clear();
    }
}

#[cfg(test)]
#[path = "../tests/unit/frames.rs"]
mod tests;
