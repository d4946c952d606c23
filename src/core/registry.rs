//! Identifier-keyed registry for live bridge objects (views, modes).
//!
//! One mutex guards both the map and the creation order, so every call is a
//! single critical section. Identifiers are assigned by the caller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;

/// Hook run on every entry by [`IdentifierRegistry::remove_all`].
pub trait Disposable {
    fn dispose(&self);
}

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

struct Entries<T> {
    values: FxHashMap<i64, T>,
    order: Vec<i64>,
}

impl<T> Entries<T> {
    fn forget(&mut self, id: i64) {
        if let Some(index) = self.order.iter().position(|&entry| entry == id) {
            self.order.remove(index);
        }
    }
}

pub struct IdentifierRegistry<T> {
    entries: Mutex<Entries<T>>,
}

impl<T: Clone> IdentifierRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                values: FxHashMap::default(),
                order: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries<T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts `value` as the new topmost entry.
    ///
    /// Re-adding a live id replaces its value and moves it to the top; the
    /// replaced value is handed back undisposed.
    pub fn add(&self, id: i64, value: T) -> Option<T> {
        let mut entries = self.lock();
        entries.forget(id);
        entries.order.push(id);
        entries.values.insert(id, value)
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.lock().values.get(&id).cloned()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.lock().values.contains_key(&id)
    }

    /// Value of the most recently added id that is still present.
    pub fn get_topmost(&self) -> Option<T> {
        let entries = self.lock();
        let id = entries.order.last()?;
        entries.values.get(id).cloned()
    }

    /// Removes the entry without disposing it.
    pub fn remove(&self, id: i64) -> Option<T> {
        let mut entries = self.lock();
        entries.forget(id);
        entries.values.remove(&id)
    }

    /// Snapshot of the live values in creation order.
    pub fn values(&self) -> Vec<T> {
        let entries = self.lock();
        entries
            .order
            .iter()
            .filter_map(|id| entries.values.get(id).cloned())
            .collect()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.lock().order.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Disposable> IdentifierRegistry<T> {
    /// Empties the registry, then disposes the removed entries in creation
    /// order. Disposal runs without the lock held, so it may call back into
    /// the registry.
    pub fn remove_all(&self) {
        let (mut values, order) = {
            let mut entries = self.lock();
            (
                std::mem::take(&mut entries.values),
                std::mem::take(&mut entries.order),
            )
        };
        for id in order {
            if let Some(value) = values.remove(&id) {
                value.dispose();
            }
        }
    }
}

impl<T: Clone> Default for IdentifierRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/registry.rs"]
mod tests;
