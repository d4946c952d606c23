//! The core module: context, views, camera and frames behind one API.
//!
//! Context and view mutations are marshalled onto the [`MainThread`]:
//! synchronously where the caller needs the outcome before returning
//! (create/update/dispose, view lifecycle, modes), asynchronously for the
//! rest (coordinate mapping, camera switches). Continuations hold only a
//! weak reference to the module and reject with `NIL_SELF` once it is gone.

use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::command::{Command, CoreModuleCommandFactory};
use crate::config::FramesHandlingConfiguration;
use crate::context::CaptureContextManager;
use crate::core::{CoreError, Disposable, IdentifierRegistry};
use crate::engine::{
    CaptureEngine, ContextObserver, FrameSourceState, Point, Quadrilateral,
};
use crate::event::Emitter;
use crate::frame_source::FrameSourceHandler;
use crate::frames::FrameCache;
use crate::lifecycle::ObserverDispatcher;
use crate::listener::{ContextListener, FrameSourceListener};
use crate::method::MethodCall;
use crate::module::FrameworkModule;
use crate::result::ResultSink;
use crate::runtime::MainThread;
use crate::view::{CaptureView, ViewCreationData};

pub const CORE_MODULE_NAME: &str = "CoreModule";

/// Operations reachable through core commands. Every operation reports on
/// `result` exactly once, possibly from another thread.
pub trait CoreApi: Send + Sync {
    fn get_camera_state(&self, camera_position: &str, result: Arc<dyn ResultSink>);
    fn switch_camera_to_desired_state(&self, state_json: &str, result: Arc<dyn ResultSink>);
    fn is_torch_available(&self, camera_position: &str, result: Arc<dyn ResultSink>);
    fn register_frame_source_listener(&self, result: Arc<dyn ResultSink>);
    fn unregister_frame_source_listener(&self, result: Arc<dyn ResultSink>);

    fn get_last_frame_as_json(&self, frame_id: &str, result: Arc<dyn ResultSink>);
    fn get_last_frame_or_null_as_json(&self, frame_id: &str, result: Arc<dyn ResultSink>);
    fn get_last_frame_or_null_as_map(&self, frame_id: &str, result: Arc<dyn ResultSink>);

    fn create_context_from_json(&self, context_json: &str, result: Arc<dyn ResultSink>);
    fn update_context_from_json(&self, context_json: &str, result: Arc<dyn ResultSink>);
    fn subscribe_context_listener(&self, result: Arc<dyn ResultSink>);
    fn unsubscribe_context_listener(&self, result: Arc<dyn ResultSink>);
    fn add_mode_to_context(&self, mode_json: &str, result: Arc<dyn ResultSink>);
    fn remove_mode_from_context(&self, mode_json: &str, result: Arc<dyn ResultSink>);
    fn remove_all_modes(&self, result: Arc<dyn ResultSink>);
    fn get_open_source_software_license_info(&self, result: Arc<dyn ResultSink>);
    fn dispose_context(&self, result: Arc<dyn ResultSink>);

    fn view_point_for_frame_point(&self, view_id: i64, point_json: &str, result: Arc<dyn ResultSink>);
    fn view_quadrilateral_for_frame_quadrilateral(
        &self,
        view_id: i64,
        quadrilateral_json: &str,
        result: Arc<dyn ResultSink>,
    );
    fn register_listener_for_view_events(&self, view_id: i64, result: Arc<dyn ResultSink>);
    fn unregister_listener_for_view_events(&self, view_id: i64, result: Arc<dyn ResultSink>);
    fn create_data_capture_view(&self, view_json: &str, result: Arc<dyn ResultSink>);
    fn update_data_capture_view(&self, view_json: &str, result: Arc<dyn ResultSink>);
    fn remove_data_capture_view(&self, view_id: i64, result: Arc<dyn ResultSink>);

    fn emit_feedback(&self, feedback_json: &str, result: Arc<dyn ResultSink>);
    fn get_defaults(&self, result: Arc<dyn ResultSink>);
}

pub struct CoreModule {
    engine: Arc<dyn CaptureEngine>,
    emitter: Arc<dyn Emitter>,
    main_thread: Arc<MainThread>,
    dispatcher: Arc<ObserverDispatcher>,
    frame_sources: Arc<FrameSourceHandler>,
    contexts: Arc<CaptureContextManager>,
    context_listener: Arc<ContextListener>,
    views: IdentifierRegistry<Arc<CaptureView>>,
    frames: Arc<FrameCache>,
    this: Weak<Self>,
}

impl CoreModule {
    pub fn new(
        engine: Arc<dyn CaptureEngine>,
        emitter: Arc<dyn Emitter>,
        main_thread: Arc<MainThread>,
        dispatcher: Arc<ObserverDispatcher>,
    ) -> Arc<Self> {
        let frame_sources = Arc::new(FrameSourceHandler::new(Arc::new(
            FrameSourceListener::new(Arc::clone(&emitter)),
        )));
        let contexts = Arc::new(CaptureContextManager::new(
            Arc::clone(&engine),
            Arc::clone(&frame_sources),
        ));
        let context_listener = Arc::new(ContextListener::new(Arc::clone(&emitter)));

        Arc::new_cyclic(|this| Self {
            engine,
            emitter,
            main_thread,
            dispatcher,
            frame_sources,
            contexts,
            context_listener,
            views: IdentifierRegistry::new(),
            frames: Arc::new(FrameCache::new()),
            this: this.clone(),
        })
    }

    pub fn dispatcher(&self) -> &Arc<ObserverDispatcher> {
        &self.dispatcher
    }

    pub fn contexts(&self) -> &Arc<CaptureContextManager> {
        &self.contexts
    }

    pub fn frame_sources(&self) -> &Arc<FrameSourceHandler> {
        &self.frame_sources
    }

    pub fn frames(&self) -> &Arc<FrameCache> {
        &self.frames
    }

    pub fn get_view(&self, view_id: i64) -> Option<Arc<CaptureView>> {
        self.views.get(view_id)
    }

    pub fn topmost_view(&self) -> Option<Arc<CaptureView>> {
        self.views.get_topmost()
    }

    pub fn view_ids(&self) -> Vec<i64> {
        self.views.ids()
    }

    pub fn is_context_listener_enabled(&self) -> bool {
        self.context_listener.is_enabled()
    }

    fn context_observer(&self) -> Arc<dyn ContextObserver> {
        self.context_listener.clone()
    }

    /// Runs `job` on the main thread and waits for it.
    fn on_main_sync(
        &self,
        result: Arc<dyn ResultSink>,
        job: impl FnOnce(&CoreModule, Arc<dyn ResultSink>) + Send + 'static,
    ) {
        let Some(this) = self.this.upgrade() else {
            tracing::error!("core module released before a main thread job");
            result.reject_error(&CoreError::NilSelf);
            return;
        };
        let fallback = Arc::clone(&result);
        if self.main_thread.dispatch_sync(move || job(&this, result)).is_none() {
            fallback.reject_error(&CoreError::NilSelf);
        }
    }

    /// Queues `job` on the main thread without waiting.
    fn on_main_async(
        &self,
        result: Arc<dyn ResultSink>,
        job: impl FnOnce(&CoreModule, Arc<dyn ResultSink>) + Send + 'static,
    ) {
        let this = self.this.clone();
        self.main_thread.dispatch_async(move || match this.upgrade() {
            Some(this) => job(&this, result),
            None => {
                tracing::error!("core module released before a main thread job");
                result.reject_error(&CoreError::NilSelf);
            }
        });
    }

    fn create_context(&self, json: &str, result: &dyn ResultSink) {
        if self.contexts.is_initialized() {
            self.dispose_context_now();
        }
        match self.contexts.initialize(json, self.context_observer()) {
            Ok(()) => {
                self.frames
                    .configure(FramesHandlingConfiguration::from_context_json(json));
                result.success(Value::Null);
            }
            Err(error) => {
                tracing::error!(%error, "failed to create the capture context");
                result.reject_error(&error);
            }
        }
    }

    fn update_context(&self, json: &str, result: &dyn ResultSink) {
        if !self.contexts.is_initialized() {
            self.create_context(json, result);
            return;
        }
        match self.contexts.update(json) {
            Ok(()) => result.success(Value::Null),
            Err(error) => {
                tracing::error!(%error, "failed to update the capture context");
                result.reject_error(&error);
            }
        }
    }

    /// Tears everything down in dependency order: views, context, camera,
    /// cached frames. Observers hear about it last.
    fn dispose_context_now(&self) {
        self.views.remove_all();
        self.contexts.release(&self.context_observer());
        self.frame_sources.release_camera();
        self.frames.release();
        self.dispatcher.dispatch_context_disposed();
        tracing::info!("capture context disposed");
    }

    fn create_view(&self, json: &str, result: &dyn ResultSink) {
        let data = match ViewCreationData::from_json(json) {
            Ok(data) => data,
            Err(error) => return result.reject_error(&error),
        };
        if self.views.contains(data.view_id) {
            tracing::debug!(view_id = data.view_id, "view already exists");
            result.success(Value::Null);
            return;
        }

        let created = self.contexts.with_context(|context| {
            CaptureView::create(
                self.engine.as_ref(),
                context,
                &data,
                Arc::clone(&self.emitter),
                Arc::clone(&self.dispatcher),
            )
        });
        let view = match created {
            Some(Ok(view)) => Arc::new(view),
            Some(Err(error)) => return result.reject_error(&error),
            None => return result.reject_error(&CoreError::NilDataCaptureContext),
        };

        for overlay_json in &data.overlays {
            if let Err(error) = self.dispatcher.dispatch_overlay_add(overlay_json, &view) {
                view.dispose();
                result.reject_error(&CoreError::from(error));
                return;
            }
        }

        self.views.add(data.view_id, Arc::clone(&view));
        self.dispatcher.dispatch_view_deserialized(&view);
        tracing::info!(
            view_id = data.view_id,
            parent_id = ?data.parent_id,
            overlays = data.overlays.len(),
            "view created"
        );
        result.success(Value::Null);
    }

    fn update_view(&self, json: &str, result: &dyn ResultSink) {
        let data = match ViewCreationData::from_json(json) {
            Ok(data) => data,
            Err(error) => return result.reject_error(&error),
        };
        let Some(view) = self.views.get(data.view_id) else {
            return result.reject_error(&CoreError::NilDataCaptureView);
        };
        match view.update(&data.view_json) {
            Ok(()) => result.success(Value::Null),
            Err(error) => result.reject_error(&error),
        }
    }

    fn remove_view(&self, view_id: i64) {
        let Some(view) = self.views.remove(view_id) else {
            tracing::debug!(view_id, "no view to remove");
            return;
        };
        view.dispose();
        self.dispatcher.dispatch_view_removed(&view);
        tracing::info!(view_id, "view removed");
    }

    fn map_point(&self, view_id: i64, json: &str, result: &dyn ResultSink) {
        let Some(view) = self.views.get(view_id) else {
            return result.reject_error(&CoreError::NilDataCaptureView);
        };
        let Ok(point) = serde_json::from_str::<Point>(json) else {
            return result.reject_error(&CoreError::invalid_json(json));
        };
        let Some(mapped) = view.view_point_for_frame_point(point) else {
            return result.reject_error(&CoreError::NilDataCaptureView);
        };
        match serde_json::to_string(&mapped) {
            Ok(encoded) => result.success(Value::String(encoded)),
            Err(error) => result.reject_error(&CoreError::from(error)),
        }
    }

    fn map_quadrilateral(&self, view_id: i64, json: &str, result: &dyn ResultSink) {
        let Some(view) = self.views.get(view_id) else {
            return result.reject_error(&CoreError::NilDataCaptureView);
        };
        let Ok(quad) = serde_json::from_str::<Quadrilateral>(json) else {
            return result.reject_error(&CoreError::invalid_json(json));
        };
        let Some(mapped) = view.view_quadrilateral_for_frame_quadrilateral(quad) else {
            return result.reject_error(&CoreError::NilDataCaptureView);
        };
        match serde_json::to_string(&mapped) {
            Ok(encoded) => result.success(Value::String(encoded)),
            Err(error) => result.reject_error(&CoreError::from(error)),
        }
    }
}

impl CoreApi for CoreModule {
    fn get_camera_state(&self, camera_position: &str, result: Arc<dyn ResultSink>) {
        match self.frame_sources.camera_state_by_position(camera_position) {
            Some(state) => result.success(Value::from(state.as_str())),
            None => {
                tracing::warn!(camera_position, "no camera at the requested position");
                result.reject_error(&CoreError::CameraNotReady);
            }
        }
    }

    fn switch_camera_to_desired_state(&self, state_json: &str, result: Arc<dyn ResultSink>) {
        let requested = state_json.to_string();
        self.on_main_async(result, move |module, result| {
            let state = FrameSourceState::from_arg(&requested);
            module.frame_sources.switch_to_state(
                state,
                Box::new(move |switched| {
                    if switched {
                        result.success(Value::Null);
                    } else {
                        result.reject_error(&CoreError::CameraSwitchFailed { state: requested });
                    }
                }),
            );
        });
    }

    fn is_torch_available(&self, camera_position: &str, result: Arc<dyn ResultSink>) {
        if !self.frame_sources.has_camera() {
            return result.reject_error(&CoreError::CameraNotReady);
        }
        match self.frame_sources.is_torch_available_by_position(camera_position) {
            Some(available) => result.success(Value::Bool(available)),
            None => result.reject_error(&CoreError::WrongCameraPosition),
        }
    }

    fn register_frame_source_listener(&self, result: Arc<dyn ResultSink>) {
        self.frame_sources.listener().enable();
        result.success(Value::Null);
    }

    fn unregister_frame_source_listener(&self, result: Arc<dyn ResultSink>) {
        self.frame_sources.listener().disable();
        result.success(Value::Null);
    }

    fn get_last_frame_as_json(&self, frame_id: &str, result: Arc<dyn ResultSink>) {
        match self.frames.get(frame_id) {
            Some(frame) => result.success(Value::String(frame.to_string())),
            None => result.reject_error(&CoreError::FrameUnavailable {
                frame_id: frame_id.to_string(),
            }),
        }
    }

    fn get_last_frame_or_null_as_json(&self, frame_id: &str, result: Arc<dyn ResultSink>) {
        let frame = self.frames.get(frame_id);
        result.success(frame.map_or(Value::Null, |frame| Value::String(frame.to_string())));
    }

    fn get_last_frame_or_null_as_map(&self, frame_id: &str, result: Arc<dyn ResultSink>) {
        result.success(self.frames.get(frame_id).unwrap_or(Value::Null));
    }

    fn create_context_from_json(&self, context_json: &str, result: Arc<dyn ResultSink>) {
        let json = context_json.to_string();
        self.on_main_sync(result, move |module, result| {
            module.create_context(&json, result.as_ref());
        });
    }

    fn update_context_from_json(&self, context_json: &str, result: Arc<dyn ResultSink>) {
        let json = context_json.to_string();
        self.on_main_sync(result, move |module, result| {
            module.update_context(&json, result.as_ref());
        });
    }

    fn subscribe_context_listener(&self, result: Arc<dyn ResultSink>) {
        self.context_listener.enable();
        result.success(Value::Null);
    }

    fn unsubscribe_context_listener(&self, result: Arc<dyn ResultSink>) {
        self.context_listener.disable();
        result.success(Value::Null);
    }

    fn add_mode_to_context(&self, mode_json: &str, result: Arc<dyn ResultSink>) {
        let json = mode_json.to_string();
        self.on_main_sync(result, move |module, result| {
            if !module.contexts.is_initialized() {
                return result.reject_error(&CoreError::NilDataCaptureContext);
            }
            match module.dispatcher.dispatch_mode_add(&json) {
                Ok(()) => result.success(Value::Null),
                Err(error) => result.reject_error(&CoreError::from(error)),
            }
        });
    }

    fn remove_mode_from_context(&self, mode_json: &str, result: Arc<dyn ResultSink>) {
        let json = mode_json.to_string();
        self.on_main_sync(result, move |module, result| {
            module.dispatcher.dispatch_mode_removed(&json);
            result.success(Value::Null);
        });
    }

    fn remove_all_modes(&self, result: Arc<dyn ResultSink>) {
        self.on_main_sync(result, |module, result| {
            module.contexts.remove_all_modes();
            module.dispatcher.dispatch_all_modes_removed();
            result.success(Value::Null);
        });
    }

    fn get_open_source_software_license_info(&self, result: Arc<dyn ResultSink>) {
        result.success(Value::String(self.engine.open_source_software_license_info()));
    }

    fn dispose_context(&self, result: Arc<dyn ResultSink>) {
        self.on_main_sync(result, |module, result| {
            module.dispose_context_now();
            result.success(Value::Null);
        });
    }

    fn view_point_for_frame_point(&self, view_id: i64, point_json: &str, result: Arc<dyn ResultSink>) {
        let json = point_json.to_string();
        self.on_main_async(result, move |module, result| {
            module.map_point(view_id, &json, result.as_ref());
        });
    }

    fn view_quadrilateral_for_frame_quadrilateral(
        &self,
        view_id: i64,
        quadrilateral_json: &str,
        result: Arc<dyn ResultSink>,
    ) {
        let json = quadrilateral_json.to_string();
        self.on_main_async(result, move |module, result| {
            module.map_quadrilateral(view_id, &json, result.as_ref());
        });
    }

    fn register_listener_for_view_events(&self, view_id: i64, result: Arc<dyn ResultSink>) {
        match self.views.get(view_id) {
            Some(view) => {
                view.enable_listener();
                result.success(Value::Null);
            }
            None => result.reject_error(&CoreError::NilDataCaptureView),
        }
    }

    fn unregister_listener_for_view_events(&self, view_id: i64, result: Arc<dyn ResultSink>) {
        match self.views.get(view_id) {
            Some(view) => {
                view.disable_listener();
                result.success(Value::Null);
            }
            None => result.reject_error(&CoreError::NilDataCaptureView),
        }
    }

    fn create_data_capture_view(&self, view_json: &str, result: Arc<dyn ResultSink>) {
        let json = view_json.to_string();
        self.on_main_sync(result, move |module, result| {
            module.create_view(&json, result.as_ref());
        });
    }

    fn update_data_capture_view(&self, view_json: &str, result: Arc<dyn ResultSink>) {
        let json = view_json.to_string();
        self.on_main_sync(result, move |module, result| {
            module.update_view(&json, result.as_ref());
        });
    }

    fn remove_data_capture_view(&self, view_id: i64, result: Arc<dyn ResultSink>) {
        self.on_main_sync(result, move |module, result| {
            module.remove_view(view_id);
            result.success(Value::Null);
        });
    }

    fn emit_feedback(&self, feedback_json: &str, result: Arc<dyn ResultSink>) {
        let Ok(feedback) = serde_json::from_str::<Value>(feedback_json) else {
            return result.reject_error(&CoreError::invalid_json(feedback_json));
        };
        match self.engine.emit_feedback(&feedback) {
            Ok(()) => result.success(Value::Null),
            Err(error) => result.reject_error(&CoreError::from(error)),
        }
    }

    fn get_defaults(&self, result: Arc<dyn ResultSink>) {
        result.success(self.engine.defaults());
    }
}

impl FrameworkModule for CoreModule {
    fn name(&self) -> &'static str {
        CORE_MODULE_NAME
    }

    fn did_start(&self) {
        tracing::info!(module = CORE_MODULE_NAME, "module started");
    }

    /// Disposes the context, if any.
    fn did_stop(&self) {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        if self
            .main_thread
            .dispatch_sync(move || this.dispose_context_now())
            .is_none()
        {
            tracing::error!(module = CORE_MODULE_NAME, "context disposal never ran");
        }
        tracing::info!(module = CORE_MODULE_NAME, "module stopped");
    }

    fn create_command(&self, call: &dyn MethodCall) -> Option<Box<dyn Command>> {
        let this: Arc<dyn CoreApi> = self.this.upgrade()?;
        CoreModuleCommandFactory::create(this, call)
    }

    fn defaults(&self) -> Value {
        self.engine.defaults()
    }
}

#[cfg(test)]
#[path = "../tests/unit/core_module.rs"]
mod tests;
