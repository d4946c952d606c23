//! In-process engine used by the stdio binary and by tests.
//!
//! It keeps just enough state to observe what the bridge asked for: every
//! port call is appended to a shared call log, and helpers let tests play
//! the engine side of callbacks (status changes, resizes, camera switches).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{json, Map, Value};

use super::{
    CameraPosition, CaptureEngine, ContextObserver, EngineContext, EngineError, EngineMode,
    EngineResult, EngineView, FrameSource, FrameSourceKind, FrameSourceObserver,
    FrameSourceState, Overlay, Point, Quadrilateral, Size, SwitchCompletion, TorchState,
    ViewObserver,
};
use crate::context::ContextData;

type CallLog = Arc<Mutex<Vec<String>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record(calls: &CallLog, call: impl Into<String>) {
    lock(calls).push(call.into());
}

fn type_field(json: &Value) -> EngineResult<String> {
    json.get("type")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(EngineError::MissingField("type"))
}

#[derive(Default)]
pub struct MemoryEngine {
    calls: CallLog,
    context: Mutex<Option<Arc<Mutex<ContextState>>>>,
    frame_source: Mutex<Option<Arc<MemoryFrameSource>>>,
    views: Mutex<Vec<Arc<Mutex<ViewState>>>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every port call so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn last_frame_source(&self) -> Option<Arc<MemoryFrameSource>> {
        lock(&self.frame_source).clone()
    }

    /// Settings held by the most recently created context.
    pub fn context_settings(&self) -> Option<Map<String, Value>> {
        let context = lock(&self.context).clone()?;
        let settings = lock(&context).settings.clone();
        Some(settings)
    }

    /// Types of the modes attached to the most recently created context.
    pub fn context_modes(&self) -> Vec<String> {
        let Some(context) = lock(&self.context).clone() else {
            return Vec::new();
        };
        let modes = lock(&context)
            .modes
            .iter()
            .map(|mode| mode.mode_type().to_string())
            .collect();
        modes
    }

    pub fn context_has_frame_source(&self) -> bool {
        let Some(context) = lock(&self.context).clone() else {
            return false;
        };
        let has_source = lock(&context).frame_source.is_some();
        has_source
    }

    pub fn notify_observation_started(&self) {
        for observer in self.context_observers() {
            observer.on_observation_started();
        }
    }

    pub fn notify_status(&self, status: &Value) {
        for observer in self.context_observers() {
            observer.on_status_changed(status);
        }
    }

    /// Simulates a layout pass on every view that is still attached.
    pub fn resize_views(&self, size: Size, orientation: &str) {
        let views = lock(&self.views).clone();
        for view in views {
            let observers = {
                let state = lock(&view);
                if state.removed {
                    continue;
                }
                state.observers.clone()
            };
            for observer in observers {
                observer.on_size_changed(size, orientation);
            }
        }
    }

    /// Overlay types of every attached view, in attachment order.
    pub fn view_overlays(&self) -> Vec<Vec<String>> {
        lock(&self.views)
            .iter()
            .filter_map(|view| {
                let state = lock(view);
                (!state.removed).then(|| state.overlays.clone())
            })
            .collect()
    }

    fn context_observers(&self) -> Vec<Arc<dyn ContextObserver>> {
        let Some(context) = lock(&self.context).clone() else {
            return Vec::new();
        };
        let observers = lock(&context).observers.clone();
        observers
    }
}

impl CaptureEngine for MemoryEngine {
    fn create_context(&self, data: &ContextData) -> EngineResult<Box<dyn EngineContext>> {
        if data.license_key.trim().is_empty() {
            return Err(EngineError::Rejected("license key is empty".to_string()));
        }
        record(&self.calls, "create_context");

        let state = Arc::new(Mutex::new(ContextState {
            settings: data.settings.clone(),
            ..ContextState::default()
        }));
        *lock(&self.context) = Some(Arc::clone(&state));
        Ok(Box::new(MemoryContext {
            state,
            calls: Arc::clone(&self.calls),
        }))
    }

    fn deserialize_frame_source(&self, json: &Value) -> EngineResult<Arc<dyn FrameSource>> {
        let kind = match type_field(json)?.as_str() {
            "camera" => FrameSourceKind::Camera,
            "image" => FrameSourceKind::Image,
            other => {
                return Err(EngineError::Unsupported {
                    kind: "frame source",
                    name: other.to_string(),
                })
            }
        };
        let position = match kind {
            FrameSourceKind::Camera => json
                .get("position")
                .and_then(Value::as_str)
                .map(CameraPosition::from_arg)
                .unwrap_or(CameraPosition::WorldFacing),
            FrameSourceKind::Image => CameraPosition::Unspecified,
        };
        let torch_available = json
            .get("torchAvailable")
            .and_then(Value::as_bool)
            .unwrap_or(position == CameraPosition::WorldFacing);

        record(&self.calls, format!("deserialize_frame_source:{}", position.as_str()));
        let source = Arc::new(MemoryFrameSource::new(kind, position, torch_available));
        *lock(&self.frame_source) = Some(Arc::clone(&source));
        Ok(source)
    }

    fn deserialize_view(
        &self,
        _context: &mut dyn EngineContext,
        json: &Value,
    ) -> EngineResult<Box<dyn EngineView>> {
        if !json.is_object() {
            return Err(EngineError::Rejected("view json must be an object".to_string()));
        }
        record(&self.calls, "deserialize_view");

        let state = Arc::new(Mutex::new(ViewState {
            json: json.clone(),
            ..ViewState::default()
        }));
        lock(&self.views).push(Arc::clone(&state));
        Ok(Box::new(MemoryView {
            state,
            calls: Arc::clone(&self.calls),
        }))
    }

    fn deserialize_mode(&self, json: &Value) -> EngineResult<Arc<dyn EngineMode>> {
        let mode_type = type_field(json)?;
        record(&self.calls, format!("deserialize_mode:{mode_type}"));
        Ok(Arc::new(MemoryMode { mode_type }))
    }

    fn deserialize_overlay(&self, json: &Value) -> EngineResult<Arc<dyn Overlay>> {
        let overlay_type = type_field(json)?;
        record(&self.calls, format!("deserialize_overlay:{overlay_type}"));
        Ok(Arc::new(MemoryOverlay { overlay_type }))
    }

    fn emit_feedback(&self, feedback: &Value) -> EngineResult<()> {
        if !feedback.is_object() {
            return Err(EngineError::Rejected("feedback json must be an object".to_string()));
        }
        record(&self.calls, "emit_feedback");
        Ok(())
    }

    fn open_source_software_license_info(&self) -> String {
        "scanbridge memory engine: no third-party components".to_string()
    }

    fn defaults(&self) -> Value {
        json!({
            "Version": env!("CARGO_PKG_VERSION"),
            "deviceID": "memory-engine",
            "Camera": {
                "Settings": { "preferredResolution": "auto", "zoomFactor": 1.0 },
                "defaultPosition": CameraPosition::WorldFacing.as_str(),
                "availablePositions": [
                    CameraPosition::WorldFacing.as_str(),
                    CameraPosition::UserFacing.as_str(),
                ],
            },
            "DataCaptureView": {
                "scanAreaMargins": { "left": 0, "top": 0, "right": 0, "bottom": 0 },
                "pointOfInterest": { "x": 0.5, "y": 0.5 },
            },
        })
    }
}

#[derive(Default)]
struct ContextState {
    settings: Map<String, Value>,
    frame_source: Option<Arc<dyn FrameSource>>,
    modes: Vec<Arc<dyn EngineMode>>,
    observers: Vec<Arc<dyn ContextObserver>>,
}

struct MemoryContext {
    state: Arc<Mutex<ContextState>>,
    calls: CallLog,
}

impl EngineContext for MemoryContext {
    fn apply_settings(&mut self, settings: &Map<String, Value>) {
        record(&self.calls, "apply_settings");
        lock(&self.state).settings = settings.clone();
    }

    fn set_frame_source(&mut self, source: Option<Arc<dyn FrameSource>>) {
        record(&self.calls, "set_frame_source");
        lock(&self.state).frame_source = source;
    }

    fn add_mode(&mut self, mode: Arc<dyn EngineMode>) {
        record(&self.calls, format!("add_mode:{}", mode.mode_type()));
        lock(&self.state).modes.push(mode);
    }

    fn remove_mode(&mut self, mode: &Arc<dyn EngineMode>) {
        record(&self.calls, format!("remove_mode:{}", mode.mode_type()));
        lock(&self.state)
            .modes
            .retain(|held| !Arc::ptr_eq(held, mode));
    }

    fn remove_all_modes(&mut self) {
        record(&self.calls, "remove_all_modes");
        lock(&self.state).modes.clear();
    }

    fn add_observer(&mut self, observer: Arc<dyn ContextObserver>) {
        lock(&self.state).observers.push(observer);
    }

    fn remove_observer(&mut self, observer: &Arc<dyn ContextObserver>) {
        lock(&self.state)
            .observers
            .retain(|held| !Arc::ptr_eq(held, observer));
    }

    fn dispose(&mut self) {
        record(&self.calls, "context.dispose");
        let mut state = lock(&self.state);
        state.frame_source = None;
        state.modes.clear();
        state.observers.clear();
    }
}

#[derive(Default)]
struct ViewState {
    json: Value,
    overlays: Vec<String>,
    observers: Vec<Arc<dyn ViewObserver>>,
    removed: bool,
}

struct MemoryView {
    state: Arc<Mutex<ViewState>>,
    calls: CallLog,
}

impl EngineView for MemoryView {
    fn update(&mut self, json: &Value) -> EngineResult<()> {
        let Some(patch) = json.as_object() else {
            return Err(EngineError::Rejected("view json must be an object".to_string()));
        };
        record(&self.calls, "view.update");
        let mut state = lock(&self.state);
        if let Some(current) = state.json.as_object_mut() {
            for (key, value) in patch {
                current.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    fn view_point_for_frame_point(&self, point: Point) -> Point {
        point
    }

    fn view_quadrilateral_for_frame_quadrilateral(&self, quad: Quadrilateral) -> Quadrilateral {
        quad
    }

    fn add_overlay(&mut self, overlay: Arc<dyn Overlay>) {
        record(&self.calls, format!("view.add_overlay:{}", overlay.overlay_type()));
        lock(&self.state)
            .overlays
            .push(overlay.overlay_type().to_string());
    }

    fn remove_overlay(&mut self, overlay: &Arc<dyn Overlay>) {
        record(&self.calls, format!("view.remove_overlay:{}", overlay.overlay_type()));
        let mut state = lock(&self.state);
        if let Some(index) = state
            .overlays
            .iter()
            .position(|held| held == overlay.overlay_type())
        {
            state.overlays.remove(index);
        }
    }

    fn add_observer(&mut self, observer: Arc<dyn ViewObserver>) {
        lock(&self.state).observers.push(observer);
    }

    fn remove_observer(&mut self, observer: &Arc<dyn ViewObserver>) {
        lock(&self.state)
            .observers
            .retain(|held| !Arc::ptr_eq(held, observer));
    }

    fn remove_from_parent(&mut self) {
        record(&self.calls, "view.remove_from_parent");
        lock(&self.state).removed = true;
    }
}

struct MemoryMode {
    mode_type: String,
}

impl EngineMode for MemoryMode {
    fn mode_type(&self) -> &str {
        &self.mode_type
    }
}

struct MemoryOverlay {
    overlay_type: String,
}

impl Overlay for MemoryOverlay {
    fn overlay_type(&self) -> &str {
        &self.overlay_type
    }
}

#[derive(Default)]
struct SourceState {
    current: FrameSourceState,
    desired: FrameSourceState,
    torch: TorchState,
}

/// Camera or image source. Switches complete synchronously on the calling
/// thread unless [`MemoryFrameSource::fail_switches`] was set.
pub struct MemoryFrameSource {
    kind: FrameSourceKind,
    position: CameraPosition,
    torch_available: bool,
    switch_succeeds: AtomicBool,
    state: Mutex<SourceState>,
    observers: Mutex<Vec<Arc<dyn FrameSourceObserver>>>,
}

impl MemoryFrameSource {
    fn new(kind: FrameSourceKind, position: CameraPosition, torch_available: bool) -> Self {
        Self {
            kind,
            position,
            torch_available,
            switch_succeeds: AtomicBool::new(true),
            state: Mutex::new(SourceState::default()),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_switches(&self, fail: bool) {
        self.switch_succeeds.store(!fail, Ordering::Release);
    }

    pub fn torch_state(&self) -> TorchState {
        lock(&self.state).torch
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.observers).len()
    }

    fn notify(&self, f: impl Fn(&dyn FrameSourceObserver)) {
        let observers = lock(&self.observers).clone();
        for observer in observers {
            f(observer.as_ref());
        }
    }
}

impl FrameSource for MemoryFrameSource {
    fn kind(&self) -> FrameSourceKind {
        self.kind
    }

    fn position(&self) -> CameraPosition {
        self.position
    }

    fn current_state(&self) -> FrameSourceState {
        lock(&self.state).current
    }

    fn desired_state(&self) -> FrameSourceState {
        lock(&self.state).desired
    }

    fn is_torch_available(&self) -> bool {
        self.torch_available
    }

    fn set_desired_torch_state(&self, state: TorchState) {
        lock(&self.state).torch = state;
        self.notify(|observer| observer.on_torch_state_changed(state));
    }

    fn switch_to_desired_state(&self, state: FrameSourceState, done: Option<SwitchCompletion>) {
        lock(&self.state).desired = state;
        let succeeded = self.switch_succeeds.load(Ordering::Acquire);
        if succeeded {
            lock(&self.state).current = state;
            let position = (self.kind == FrameSourceKind::Camera).then_some(self.position);
            self.notify(|observer| observer.on_state_changed(state, position));
        }
        if let Some(done) = done {
            done(succeeded);
        }
    }

    fn add_observer(&self, observer: Arc<dyn FrameSourceObserver>) {
        lock(&self.observers).push(observer);
    }

    fn remove_observer(&self, observer: &Arc<dyn FrameSourceObserver>) {
        lock(&self.observers).retain(|held| !Arc::ptr_eq(held, observer));
    }
}
