//! Commands: one method call, its extracted arguments, and the module it
//! runs against.

mod core_command;
mod factory;

use std::sync::Arc;

use crate::core::MISSING_PARAMETER;
use crate::result::ResultSink;

pub use core_command::CoreCommand;
pub use factory::{CoreModuleCommandFactory, METHODS};

/// A bound, ready-to-run method call. Arguments are read when the command is
/// built, so a command that cannot run is known before anything happens.
pub trait Command: Send {
    fn method(&self) -> &'static str;

    /// Runs once. Every path ends in exactly one `success` or `reject`.
    fn execute(self: Box<Self>, result: Arc<dyn ResultSink>);
}

pub fn reject_missing(result: &dyn ResultSink, parameter: &str) {
    tracing::warn!(parameter, "rejecting command with a missing parameter");
    result.reject(
        MISSING_PARAMETER,
        &format!("Required parameter '{parameter}' is missing"),
        None,
    );
}
