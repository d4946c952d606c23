use std::sync::Arc;

use super::{Command, CoreCommand};
use crate::core_module::CoreApi;
use crate::method::MethodCall;
use crate::result::ResultSink;

/// Every method name [`CoreModuleCommandFactory`] resolves.
pub const METHODS: &[&str] = &[
    "getCameraState",
    "switchCameraToDesiredState",
    "isTorchAvailable",
    "registerFrameSourceListener",
    "unregisterFrameSourceListener",
    "getLastFrameAsJson",
    "getLastFrameOrNullAsJson",
    "getLastFrameOrNullAsMap",
    "createContextFromJson",
    "updateContextFromJson",
    "subscribeContextListener",
    "unsubscribeContextListener",
    "addModeToContext",
    "removeModeFromContext",
    "removeAllModes",
    "getOpenSourceSoftwareLicenseInfo",
    "disposeContext",
    "viewPointForFramePoint",
    "viewQuadrilateralForFrameQuadrilateral",
    "registerListenerForViewEvents",
    "unregisterListenerForViewEvents",
    "createDataCaptureView",
    "updateDataCaptureView",
    "removeDataCaptureView",
    "emitFeedback",
    "getDefaults",
];

pub struct CoreModuleCommandFactory;

impl CoreModuleCommandFactory {
    /// Pure lookup; unknown methods yield `None` and nothing else happens.
    pub fn create(module: Arc<dyn CoreApi>, call: &dyn MethodCall) -> Option<Box<dyn Command>> {
        let command = CoreCommand::from_call(call)?;
        Some(Box::new(BoundCoreCommand { module, command }))
    }
}

struct BoundCoreCommand {
    module: Arc<dyn CoreApi>,
    command: CoreCommand,
}

impl Command for BoundCoreCommand {
    fn method(&self) -> &'static str {
        self.command.name()
    }

    fn execute(self: Box<Self>, result: Arc<dyn ResultSink>) {
        let Self { module, command } = *self;
        tracing::debug!(method = command.name(), "executing core command");
        command.execute(module.as_ref(), result);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/command/factory.rs"]
mod tests;
