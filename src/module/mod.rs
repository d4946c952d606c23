//! Modules a transport can route method calls to.

mod generic;
mod locator;
mod mode_cache;

use serde_json::{Map, Value};

use crate::command::Command;
use crate::method::MethodCall;

pub use generic::{GenericMode, GenericModeModule};
pub use locator::{LocatorError, ModuleLocator};
pub use mode_cache::{FrameworksMode, ModeCache, PendingAction};

pub trait FrameworkModule: Send + Sync {
    /// Key the module is registered and resolved under.
    fn name(&self) -> &'static str;

    fn did_start(&self) {}

    fn did_stop(&self) {}

    /// `None` when the module has no command for `call.method()`.
    fn create_command(&self, call: &dyn MethodCall) -> Option<Box<dyn Command>>;

    fn defaults(&self) -> Value {
        Value::Object(Map::new())
    }
}
