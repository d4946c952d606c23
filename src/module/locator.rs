use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::FrameworkModule;

pub type Result<T> = std::result::Result<T, LocatorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Module not found: {0}")]
    NotFound(String),
    #[error("Module already registered: {0}")]
    AlreadyRegistered(String),
}

/// Name-keyed module registry shared by the transport and the modules.
pub struct ModuleLocator {
    modules: Mutex<FxHashMap<&'static str, Arc<dyn FrameworkModule>>>,
}

impl ModuleLocator {
    pub fn new() -> Self {
        Self {
            modules: Mutex::new(FxHashMap::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<&'static str, Arc<dyn FrameworkModule>>> {
        self.modules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, module: Arc<dyn FrameworkModule>) -> Result<()> {
        let name = module.name();
        let mut modules = self.lock();
        if modules.contains_key(name) {
            return Err(LocatorError::AlreadyRegistered(name.to_string()));
        }
        modules.insert(name, module);
        tracing::debug!(module = name, "module registered");
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn FrameworkModule>> {
        self.lock().get(name).cloned()
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn FrameworkModule>> {
        self.resolve(name)
            .ok_or_else(|| LocatorError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn FrameworkModule>> {
        self.lock().remove(name)
    }

    /// Empties the locator and hands back what it held, so the caller can
    /// stop the modules outside the lock.
    pub fn remove_all(&self) -> Vec<Arc<dyn FrameworkModule>> {
        self.lock().drain().map(|(_, module)| module).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.lock().keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for ModuleLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/module/locator.rs"]
mod tests;
