//! Ports to the native capture engine.
//!
//! The engine itself is opaque: the bridge only needs to build a context,
//! turn JSON into frame sources, views, modes and overlays, and receive
//! callbacks. Everything here is a narrow trait so a platform binding (or
//! [`memory::MemoryEngine`]) can sit behind it.

pub mod memory;
pub mod types;

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::ContextData;

pub use types::{
    CameraPosition, FrameSourceKind, FrameSourceState, Point, Quadrilateral, Size, TorchState,
};

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unsupported {kind} type `{name}`")]
    Unsupported { kind: &'static str, name: String },
    #[error("{0}")]
    Rejected(String),
}

pub type SwitchCompletion = Box<dyn FnOnce(bool) + Send>;

pub trait ContextObserver: Send + Sync {
    fn on_observation_started(&self);
    fn on_status_changed(&self, status: &Value);
}

pub trait FrameSourceObserver: Send + Sync {
    fn on_state_changed(&self, state: FrameSourceState, position: Option<CameraPosition>);
    fn on_torch_state_changed(&self, state: TorchState);
}

pub trait ViewObserver: Send + Sync {
    fn on_size_changed(&self, size: Size, orientation: &str);
}

pub trait Overlay: Send + Sync {
    fn overlay_type(&self) -> &str;
}

pub trait EngineMode: Send + Sync {
    fn mode_type(&self) -> &str;
}

pub trait FrameSource: Send + Sync {
    fn kind(&self) -> FrameSourceKind;
    /// `Unspecified` for non-camera sources.
    fn position(&self) -> CameraPosition;
    fn current_state(&self) -> FrameSourceState;
    fn desired_state(&self) -> FrameSourceState;
    fn is_torch_available(&self) -> bool;
    fn set_desired_torch_state(&self, state: TorchState);
    /// `done` may run on any thread, or never.
    fn switch_to_desired_state(&self, state: FrameSourceState, done: Option<SwitchCompletion>);
    fn add_observer(&self, observer: Arc<dyn FrameSourceObserver>);
    fn remove_observer(&self, observer: &Arc<dyn FrameSourceObserver>);
}

pub trait EngineContext: Send {
    fn apply_settings(&mut self, settings: &Map<String, Value>);
    fn set_frame_source(&mut self, source: Option<Arc<dyn FrameSource>>);
    fn add_mode(&mut self, mode: Arc<dyn EngineMode>);
    fn remove_mode(&mut self, mode: &Arc<dyn EngineMode>);
    fn remove_all_modes(&mut self);
    fn add_observer(&mut self, observer: Arc<dyn ContextObserver>);
    fn remove_observer(&mut self, observer: &Arc<dyn ContextObserver>);
    fn dispose(&mut self);
}

pub trait EngineView: Send {
    fn update(&mut self, json: &Value) -> EngineResult<()>;
    fn view_point_for_frame_point(&self, point: Point) -> Point;
    fn view_quadrilateral_for_frame_quadrilateral(&self, quad: Quadrilateral) -> Quadrilateral;
    fn add_overlay(&mut self, overlay: Arc<dyn Overlay>);
    fn remove_overlay(&mut self, overlay: &Arc<dyn Overlay>);
    fn add_observer(&mut self, observer: Arc<dyn ViewObserver>);
    fn remove_observer(&mut self, observer: &Arc<dyn ViewObserver>);
    fn remove_from_parent(&mut self);
}

pub trait CaptureEngine: Send + Sync {
    fn create_context(&self, data: &ContextData) -> EngineResult<Box<dyn EngineContext>>;
    fn deserialize_frame_source(&self, json: &Value) -> EngineResult<Arc<dyn FrameSource>>;
    fn deserialize_view(
        &self,
        context: &mut dyn EngineContext,
        json: &Value,
    ) -> EngineResult<Box<dyn EngineView>>;
    fn deserialize_mode(&self, json: &Value) -> EngineResult<Arc<dyn EngineMode>>;
    fn deserialize_overlay(&self, json: &Value) -> EngineResult<Arc<dyn Overlay>>;
    fn emit_feedback(&self, feedback: &Value) -> EngineResult<()>;
    fn open_source_software_license_info(&self) -> String;
    fn defaults(&self) -> Value;
}
