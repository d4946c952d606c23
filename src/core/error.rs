use thiserror::Error;

use crate::engine::EngineError;
use crate::lifecycle::LifecycleError;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Code used when a command is built without one of its required arguments.
pub const MISSING_PARAMETER: &str = "MISSING_PARAMETER";
/// Code used by transports when no command matches the method name.
pub const UNIMPLEMENTED_METHOD: &str = "UNIMPLEMENTED_METHOD";

type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no data capture view is available")]
    NilDataCaptureView,
    #[error("no data capture context is available")]
    NilDataCaptureContext,
    #[error("{}", describe_deserialization(.source.as_deref(), .json.as_deref()))]
    Deserialization {
        #[source]
        source: Option<Cause>,
        json: Option<String>,
    },
    #[error("no camera was deserialized yet or it was disposed")]
    CameraNotReady,
    #[error("the given camera position doesn't match the current camera's position")]
    WrongCameraPosition,
    #[error("the owning module was released before the operation ran")]
    NilSelf,
    #[error("unable to switch the camera to {state}")]
    CameraSwitchFailed { state: String },
    #[error("frame `{frame_id}` is not cached, it might have been reused already")]
    FrameUnavailable { frame_id: String },
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl CoreError {
    /// Wraps a parse or engine failure.
    pub fn deserialization(cause: impl Into<Cause>) -> Self {
        Self::Deserialization {
            source: Some(cause.into()),
            json: None,
        }
    }

    /// Used when the payload could not be read and there is no better cause.
    pub fn invalid_json(json: &str) -> Self {
        Self::Deserialization {
            source: None,
            json: Some(json.to_string()),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NilDataCaptureView => "NIL_DATA_CAPTURE_VIEW",
            Self::NilDataCaptureContext => "NIL_DATA_CAPTURE_CONTEXT",
            Self::Deserialization { .. } => "DESERIALIZATION_ERROR",
            Self::CameraNotReady => "CAMERA_NOT_READY",
            Self::WrongCameraPosition => "WRONG_CAMERA_POSITION",
            Self::NilSelf => "NIL_SELF",
            Self::CameraSwitchFailed { .. } => "CAMERA_SWITCH_FAILED",
            Self::FrameUnavailable { .. } => "FRAME_UNAVAILABLE",
            Self::Lifecycle(_) => "LIFECYCLE_ERROR",
        }
    }

    pub fn error_code(&self) -> i32 {
        match self {
            Self::NilDataCaptureView => 1,
            Self::NilDataCaptureContext => 2,
            Self::Deserialization { .. } => 3,
            Self::CameraNotReady => 4,
            Self::WrongCameraPosition => 5,
            Self::NilSelf => 6,
            Self::CameraSwitchFailed { .. } => 7,
            Self::FrameUnavailable { .. } => 8,
            Self::Lifecycle(_) => 9,
        }
    }
}

impl From<EngineError> for CoreError {
    fn from(error: EngineError) -> Self {
        Self::deserialization(error)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::deserialization(error)
    }
}

fn describe_deserialization(
    source: Option<&(dyn std::error::Error + Send + Sync)>,
    json: Option<&str>,
) -> String {
    match (source, json) {
        (Some(source), _) => format!("an internal deserialization error happened: {source}"),
        (None, Some(json)) => format!("unable to deserialize the following JSON: {json}"),
        (None, None) => "unable to deserialize the given JSON".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/error.rs"]
mod tests;
