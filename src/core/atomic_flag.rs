use std::sync::atomic::{AtomicBool, Ordering};

/// Boolean switch shared between a listener and whoever toggles it.
///
/// Listeners check it on every callback before emitting, so reads must not
/// contend with the engine's callback threads.
#[derive(Debug, Default)]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub const fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    pub fn enable(&self) {
        self.set(true);
    }

    pub fn disable(&self) {
        self.set(false);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/atomic_flag.rs"]
mod tests;
