//! Per-module cache of live modes plus the actions waiting for them.
//!
//! Actions can be queued before the mode they need exists, keyed either by
//! the mode id or by the id of the view the mode will belong to. Taking the
//! queue for a key drains it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;

use crate::core::{Disposable, IdentifierRegistry};

pub type PendingAction = Box<dyn FnOnce() + Send + 'static>;

pub trait FrameworksMode: Disposable + Send + Sync {
    fn mode_id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ActionKey {
    Mode(i64),
    Parent(i64),
}

pub struct ModeCache<T: FrameworksMode + ?Sized> {
    modes: IdentifierRegistry<Arc<T>>,
    pending: Mutex<FxHashMap<ActionKey, Vec<PendingAction>>>,
}

impl<T: FrameworksMode + ?Sized> ModeCache<T> {
    pub fn new() -> Self {
        Self {
            modes: IdentifierRegistry::new(),
            pending: Mutex::new(FxHashMap::default()),
        }
    }

    fn pending(&self) -> MutexGuard<'_, FxHashMap<ActionKey, Vec<PendingAction>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Caches `mode` under its own id. A mode already cached under that id
    /// is replaced and returned.
    pub fn add(&self, mode: Arc<T>) -> Option<Arc<T>> {
        self.modes.add(mode.mode_id(), mode)
    }

    pub fn get(&self, mode_id: i64) -> Option<Arc<T>> {
        self.modes.get(mode_id)
    }

    /// Live modes in creation order.
    pub fn get_all(&self) -> Vec<Arc<T>> {
        self.modes.values()
    }

    pub fn get_by_parent(&self, parent_id: i64) -> Option<Arc<T>> {
        self.modes
            .values()
            .into_iter()
            .find(|mode| mode.parent_id() == Some(parent_id))
    }

    /// Drops the mode from the cache without disposing it.
    pub fn remove(&self, mode_id: i64) -> Option<Arc<T>> {
        self.modes.remove(mode_id)
    }

    pub fn topmost(&self) -> Option<Arc<T>> {
        self.modes.get_topmost()
    }

    /// Disposes every cached mode in creation order and empties the cache.
    pub fn remove_all(&self) {
        self.modes.remove_all();
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn add_pending_action(&self, mode_id: i64, action: PendingAction) {
        self.pending()
            .entry(ActionKey::Mode(mode_id))
            .or_default()
            .push(action);
    }

    pub fn add_pending_action_by_parent(&self, parent_id: i64, action: PendingAction) {
        self.pending()
            .entry(ActionKey::Parent(parent_id))
            .or_default()
            .push(action);
    }

    /// Drains the actions queued for `mode_id`, oldest first.
    pub fn take_pending_actions(&self, mode_id: i64) -> Vec<PendingAction> {
        self.pending()
            .remove(&ActionKey::Mode(mode_id))
            .unwrap_or_default()
    }

    pub fn take_pending_actions_by_parent(&self, parent_id: i64) -> Vec<PendingAction> {
        self.pending()
            .remove(&ActionKey::Parent(parent_id))
            .unwrap_or_default()
    }

    /// Drops queued actions for `id` (both keyings), or all of them.
    pub fn clear_pending(&self, id: Option<i64>) {
        let mut pending = self.pending();
        match id {
            Some(id) => {
                pending.remove(&ActionKey::Mode(id));
                pending.remove(&ActionKey::Parent(id));
            }
            None => pending.clear(),
        }
    }
}

impl<T: FrameworksMode + ?Sized> Default for ModeCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/module/mode_cache.rs"]
mod tests;
