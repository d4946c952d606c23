use std::sync::Arc;

use super::reject_missing;
use crate::core_module::CoreApi;
use crate::event::{CONTEXT_EVENTS, FRAME_SOURCE_EVENTS, VIEW_EVENTS};
use crate::method::MethodCall;
use crate::result::ResultSink;

/// Every method the core module answers, with its arguments already pulled
/// out of the call. Required string arguments are `None` when absent or
/// empty; `viewId` defaults to `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    // ==================== Camera ====================
    GetCameraState { camera_position: Option<String> },
    SwitchCameraToDesiredState { state_json: Option<String> },
    IsTorchAvailable { camera_position: Option<String> },
    RegisterFrameSourceListener,
    UnregisterFrameSourceListener,

    // ==================== Frames ====================
    GetLastFrameAsJson { frame_id: Option<String> },
    GetLastFrameOrNullAsJson { frame_id: Option<String> },
    GetLastFrameOrNullAsMap { frame_id: Option<String> },

    // ==================== Context ====================
    CreateContextFromJson { context_json: Option<String> },
    UpdateContextFromJson { context_json: Option<String> },
    SubscribeContextListener,
    UnsubscribeContextListener,
    AddModeToContext { mode_json: Option<String> },
    RemoveModeFromContext { mode_json: Option<String> },
    RemoveAllModes,
    GetOpenSourceSoftwareLicenseInfo,
    DisposeContext,

    // ==================== View ====================
    ViewPointForFramePoint { view_id: i64, point_json: Option<String> },
    ViewQuadrilateralForFrameQuadrilateral { view_id: i64, quadrilateral_json: Option<String> },
    RegisterListenerForViewEvents { view_id: i64 },
    UnregisterListenerForViewEvents { view_id: i64 },
    CreateDataCaptureView { view_json: Option<String> },
    UpdateDataCaptureView { view_json: Option<String> },
    RemoveDataCaptureView { view_id: i64 },

    // ==================== Misc ====================
    EmitFeedback { feedback_json: Option<String> },
    GetDefaults,
}

fn string_arg(call: &dyn MethodCall, key: &str) -> Option<String> {
    call.string_argument(key).filter(|value| !value.is_empty())
}

fn view_id_arg(call: &dyn MethodCall) -> i64 {
    call.int_argument("viewId").unwrap_or(0)
}

/// Rejects with `MISSING_PARAMETER` when `value` is absent.
fn require(value: Option<String>, name: &str, result: &Arc<dyn ResultSink>) -> Option<String> {
    if value.is_none() {
        reject_missing(result.as_ref(), name);
    }
    value
}

impl CoreCommand {
    /// `None` for method names this module does not know.
    pub fn from_call(call: &dyn MethodCall) -> Option<Self> {
        let command = match call.method() {
            "getCameraState" => Self::GetCameraState {
                camera_position: string_arg(call, "cameraPosition"),
            },
            "switchCameraToDesiredState" => Self::SwitchCameraToDesiredState {
                state_json: string_arg(call, "stateJson"),
            },
            "isTorchAvailable" => Self::IsTorchAvailable {
                camera_position: string_arg(call, "cameraPosition"),
            },
            "registerFrameSourceListener" => Self::RegisterFrameSourceListener,
            "unregisterFrameSourceListener" => Self::UnregisterFrameSourceListener,
            "getLastFrameAsJson" => Self::GetLastFrameAsJson {
                frame_id: string_arg(call, "frameId"),
            },
            "getLastFrameOrNullAsJson" => Self::GetLastFrameOrNullAsJson {
                frame_id: string_arg(call, "frameId"),
            },
            "getLastFrameOrNullAsMap" => Self::GetLastFrameOrNullAsMap {
                frame_id: string_arg(call, "frameId"),
            },
            "createContextFromJson" => Self::CreateContextFromJson {
                context_json: string_arg(call, "contextJson"),
            },
            "updateContextFromJson" => Self::UpdateContextFromJson {
                context_json: string_arg(call, "contextJson"),
            },
            "subscribeContextListener" => Self::SubscribeContextListener,
            "unsubscribeContextListener" => Self::UnsubscribeContextListener,
            "addModeToContext" => Self::AddModeToContext {
                mode_json: string_arg(call, "modeJson"),
            },
            "removeModeFromContext" => Self::RemoveModeFromContext {
                mode_json: string_arg(call, "modeJson"),
            },
            "removeAllModes" => Self::RemoveAllModes,
            "getOpenSourceSoftwareLicenseInfo" => Self::GetOpenSourceSoftwareLicenseInfo,
            "disposeContext" => Self::DisposeContext,
            "viewPointForFramePoint" => Self::ViewPointForFramePoint {
                view_id: view_id_arg(call),
                point_json: string_arg(call, "pointJson"),
            },
            "viewQuadrilateralForFrameQuadrilateral" => {
                Self::ViewQuadrilateralForFrameQuadrilateral {
                    view_id: view_id_arg(call),
                    quadrilateral_json: string_arg(call, "quadrilateralJson"),
                }
            }
            "registerListenerForViewEvents" => Self::RegisterListenerForViewEvents {
                view_id: view_id_arg(call),
            },
            "unregisterListenerForViewEvents" => Self::UnregisterListenerForViewEvents {
                view_id: view_id_arg(call),
            },
            "createDataCaptureView" => Self::CreateDataCaptureView {
                view_json: string_arg(call, "viewJson"),
            },
            "updateDataCaptureView" => Self::UpdateDataCaptureView {
                view_json: string_arg(call, "viewJson"),
            },
            "removeDataCaptureView" => Self::RemoveDataCaptureView {
                view_id: view_id_arg(call),
            },
            "emitFeedback" => Self::EmitFeedback {
                feedback_json: string_arg(call, "feedbackJson"),
            },
            "getDefaults" => Self::GetDefaults,
            _ => return None,
        };
        Some(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetCameraState { .. } => "getCameraState",
            Self::SwitchCameraToDesiredState { .. } => "switchCameraToDesiredState",
            Self::IsTorchAvailable { .. } => "isTorchAvailable",
            Self::RegisterFrameSourceListener => "registerFrameSourceListener",
            Self::UnregisterFrameSourceListener => "unregisterFrameSourceListener",
            Self::GetLastFrameAsJson { .. } => "getLastFrameAsJson",
            Self::GetLastFrameOrNullAsJson { .. } => "getLastFrameOrNullAsJson",
            Self::GetLastFrameOrNullAsMap { .. } => "getLastFrameOrNullAsMap",
            Self::CreateContextFromJson { .. } => "createContextFromJson",
            Self::UpdateContextFromJson { .. } => "updateContextFromJson",
            Self::SubscribeContextListener => "subscribeContextListener",
            Self::UnsubscribeContextListener => "unsubscribeContextListener",
            Self::AddModeToContext { .. } => "addModeToContext",
            Self::RemoveModeFromContext { .. } => "removeModeFromContext",
            Self::RemoveAllModes => "removeAllModes",
            Self::GetOpenSourceSoftwareLicenseInfo => "getOpenSourceSoftwareLicenseInfo",
            Self::DisposeContext => "disposeContext",
            Self::ViewPointForFramePoint { .. } => "viewPointForFramePoint",
            Self::ViewQuadrilateralForFrameQuadrilateral { .. } => {
                "viewQuadrilateralForFrameQuadrilateral"
            }
            Self::RegisterListenerForViewEvents { .. } => "registerListenerForViewEvents",
            Self::UnregisterListenerForViewEvents { .. } => "unregisterListenerForViewEvents",
            Self::CreateDataCaptureView { .. } => "createDataCaptureView",
            Self::UpdateDataCaptureView { .. } => "updateDataCaptureView",
            Self::RemoveDataCaptureView { .. } => "removeDataCaptureView",
            Self::EmitFeedback { .. } => "emitFeedback",
            Self::GetDefaults => "getDefaults",
        }
    }

    /// Commands that open or close an event stream.
    pub fn is_listener_command(&self) -> bool {
        matches!(
            self,
            Self::RegisterFrameSourceListener
                | Self::UnregisterFrameSourceListener
                | Self::SubscribeContextListener
                | Self::UnsubscribeContextListener
                | Self::RegisterListenerForViewEvents { .. }
                | Self::UnregisterListenerForViewEvents { .. }
        )
    }

    pub fn execute(self, module: &dyn CoreApi, result: Arc<dyn ResultSink>) {
        match self {
            Self::GetCameraState { camera_position } => {
                if let Some(position) = require(camera_position, "cameraPosition", &result) {
                    module.get_camera_state(&position, result);
                }
            }
            Self::SwitchCameraToDesiredState { state_json } => {
                if let Some(state) = require(state_json, "stateJson", &result) {
                    module.switch_camera_to_desired_state(&state, result);
                }
            }
            Self::IsTorchAvailable { camera_position } => {
                if let Some(position) = require(camera_position, "cameraPosition", &result) {
                    module.is_torch_available(&position, result);
                }
            }
            Self::RegisterFrameSourceListener => {
                result.register_callback_for_events(FRAME_SOURCE_EVENTS);
                module.register_frame_source_listener(result);
            }
            Self::UnregisterFrameSourceListener => {
                result.unregister_callback_for_events(FRAME_SOURCE_EVENTS);
                module.unregister_frame_source_listener(result);
            }
            Self::GetLastFrameAsJson { frame_id } => {
                if let Some(frame_id) = require(frame_id, "frameId", &result) {
                    module.get_last_frame_as_json(&frame_id, result);
                }
            }
            Self::GetLastFrameOrNullAsJson { frame_id } => {
                if let Some(frame_id) = require(frame_id, "frameId", &result) {
                    module.get_last_frame_or_null_as_json(&frame_id, result);
                }
            }
            Self::GetLastFrameOrNullAsMap { frame_id } => {
                if let Some(frame_id) = require(frame_id, "frameId", &result) {
                    module.get_last_frame_or_null_as_map(&frame_id, result);
                }
            }
            Self::CreateContextFromJson { context_json } => {
                if let Some(json) = require(context_json, "contextJson", &result) {
                    module.create_context_from_json(&json, result);
                }
            }
            Self::UpdateContextFromJson { context_json } => {
                if let Some(json) = require(context_json, "contextJson", &result) {
                    module.update_context_from_json(&json, result);
                }
            }
            Self::SubscribeContextListener => {
                result.register_callback_for_events(CONTEXT_EVENTS);
                module.subscribe_context_listener(result);
            }
            Self::UnsubscribeContextListener => {
                result.unregister_callback_for_events(CONTEXT_EVENTS);
                module.unsubscribe_context_listener(result);
            }
            Self::AddModeToContext { mode_json } => {
                if let Some(json) = require(mode_json, "modeJson", &result) {
                    module.add_mode_to_context(&json, result);
                }
            }
            Self::RemoveModeFromContext { mode_json } => {
                if let Some(json) = require(mode_json, "modeJson", &result) {
                    module.remove_mode_from_context(&json, result);
                }
            }
            Self::RemoveAllModes => module.remove_all_modes(result),
            Self::GetOpenSourceSoftwareLicenseInfo => {
                module.get_open_source_software_license_info(result)
            }
            Self::DisposeContext => module.dispose_context(result),
            Self::ViewPointForFramePoint {
                view_id,
                point_json,
            } => {
                if let Some(json) = require(point_json, "pointJson", &result) {
                    module.view_point_for_frame_point(view_id, &json, result);
                }
            }
            Self::ViewQuadrilateralForFrameQuadrilateral {
                view_id,
                quadrilateral_json,
            } => {
                if let Some(json) = require(quadrilateral_json, "quadrilateralJson", &result) {
                    module.view_quadrilateral_for_frame_quadrilateral(view_id, &json, result);
                }
            }
            Self::RegisterListenerForViewEvents { view_id } => {
                result.register_view_specific_callback(view_id, VIEW_EVENTS);
                module.register_listener_for_view_events(view_id, result);
            }
            Self::UnregisterListenerForViewEvents { view_id } => {
                result.unregister_view_specific_callback(view_id, VIEW_EVENTS);
                module.unregister_listener_for_view_events(view_id, result);
            }
            Self::CreateDataCaptureView { view_json } => {
                if let Some(json) = require(view_json, "viewJson", &result) {
                    module.create_data_capture_view(&json, result);
                }
            }
            Self::UpdateDataCaptureView { view_json } => {
                if let Some(json) = require(view_json, "viewJson", &result) {
                    module.update_data_capture_view(&json, result);
                }
            }
            Self::RemoveDataCaptureView { view_id } => {
                module.remove_data_capture_view(view_id, result)
            }
            Self::EmitFeedback { feedback_json } => {
                if let Some(json) = require(feedback_json, "feedbackJson", &result) {
                    module.emit_feedback(&json, result);
                }
            }
            Self::GetDefaults => module.get_defaults(result),
        }
    }
}
