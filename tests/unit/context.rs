use super::*;

use serde_json::json;

use crate::engine::memory::MemoryEngine;
use crate::engine::FrameSourceState;
use crate::event::CONTEXT_STATUS_CHANGED;
use crate::listener::{ContextListener, FrameSourceListener};
use crate::test_support::RecordingEmitter;

struct Fixture {
    engine: Arc<MemoryEngine>,
    frame_sources: Arc<FrameSourceHandler>,
    manager: CaptureContextManager,
    emitter: Arc<RecordingEmitter>,
    listener: Arc<ContextListener>,
}

fn fixture() -> Fixture {
    let engine = Arc::new(MemoryEngine::new());
    let emitter = RecordingEmitter::new();
    let frame_sources = Arc::new(FrameSourceHandler::new(Arc::new(FrameSourceListener::new(
        emitter.clone(),
    ))));
    let manager = CaptureContextManager::new(engine.clone(), Arc::clone(&frame_sources));
    let listener = Arc::new(ContextListener::new(emitter.clone()));
    Fixture {
        engine,
        frame_sources,
        manager,
        emitter,
        listener,
    }
}

fn observer(listener: &Arc<ContextListener>) -> Arc<dyn ContextObserver> {
    listener.clone()
}

#[test]
fn test_context_data_requires_license_key() {
    assert!(ContextData::from_json(r#"{"deviceName":"pixel"}"#).is_err());

    let data = ContextData::from_json(
        r#"{"licenseKey":"key","framework":"flutter","settings":{"a":1}}"#,
    )
    .unwrap();
    assert_eq!(data.license_key, "key");
    assert_eq!(data.framework.as_deref(), Some("flutter"));
    assert_eq!(data.settings.get("a"), Some(&json!(1)));
    assert!(data.frame_source.is_none());
}

#[test]
fn test_initialize_creates_context() {
    let f = fixture();
    assert!(!f.manager.is_initialized());

    f.manager
        .initialize(r#"{"licenseKey":"key"}"#, observer(&f.listener))
        .unwrap();

    assert!(f.manager.is_initialized());
    assert_eq!(f.engine.calls(), vec!["create_context"]);
}

#[test]
fn test_initialize_with_frame_source() {
    let f = fixture();
    let json = json!({
        "licenseKey": "key",
        "frameSource": { "type": "camera", "position": "userFacing", "desiredState": "on" },
    });
    f.manager
        .initialize(&json.to_string(), observer(&f.listener))
        .unwrap();

    assert!(f.engine.context_has_frame_source());
    assert_eq!(
        f.frame_sources.camera_state_by_position("userFacing"),
        Some(FrameSourceState::On)
    );
}

#[test]
fn test_initialize_rejects_bad_payloads() {
    let f = fixture();
    assert!(f.manager.initialize("{", observer(&f.listener)).is_err());
    assert!(f
        .manager
        .initialize(r#"{"licenseKey":""}"#, observer(&f.listener))
        .is_err());
    assert!(!f.manager.is_initialized());
}

#[test]
fn test_failed_frame_source_disposes_new_context() {
    let f = fixture();
    let error = f
        .manager
        .initialize(
            r#"{"licenseKey":"key","frameSource":{"type":"video"}}"#,
            observer(&f.listener),
        )
        .unwrap_err();

    assert_eq!(error.code(), "DESERIALIZATION_ERROR");
    assert!(!f.manager.is_initialized());
    assert_eq!(f.engine.calls(), vec!["create_context", "context.dispose"]);
    assert!(!f.frame_sources.has_camera());
}

#[test]
fn test_listener_receives_engine_callbacks() {
    let f = fixture();
    f.manager
        .initialize(r#"{"licenseKey":"key"}"#, observer(&f.listener))
        .unwrap();
    f.listener.enable();

    f.engine.notify_status(&json!({"code": 260}));

    let events = f.emitter.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, CONTEXT_STATUS_CHANGED);
    assert_eq!(events[0].1, json!({"status": {"code": 260}}));
}

#[test]
fn test_update_applies_settings_then_frame_source() {
    let f = fixture();
    f.manager
        .initialize(r#"{"licenseKey":"key"}"#, observer(&f.listener))
        .unwrap();
    f.engine.clear_calls();

    f.manager
        .update(r#"{"settings":{"x":2},"frameSource":{"type":"camera"}}"#)
        .unwrap();

    assert_eq!(
        f.engine.calls(),
        vec!["apply_settings", "deserialize_frame_source:worldFacing", "set_frame_source"]
    );
    assert_eq!(f.engine.context_settings().unwrap().get("x"), Some(&json!(2)));
}

#[test]
fn test_update_keeps_settings_when_frame_source_fails() {
    let f = fixture();
    f.manager
        .initialize(r#"{"licenseKey":"key"}"#, observer(&f.listener))
        .unwrap();

    let result = f
        .manager
        .update(r#"{"settings":{"x":3},"frameSource":{"type":"hologram"}}"#);

    assert!(result.is_err());
    assert_eq!(f.engine.context_settings().unwrap().get("x"), Some(&json!(3)));
}

#[test]
#[should_panic(expected = "capture context not initialized")]
fn test_update_before_initialize_panics() {
    let f = fixture();
    let _ = f.manager.update(r#"{"settings":{}}"#);
}

#[test]
#[should_panic(expected = "capture context not initialized")]
fn test_add_mode_before_initialize_panics() {
    let f = fixture();
    let mode = f.engine.deserialize_mode(&json!({"type": "barcodeCapture"})).unwrap();
    f.manager.add_mode(mode);
}

#[test]
fn test_modes_are_forwarded() {
    let f = fixture();
    f.manager
        .initialize(r#"{"licenseKey":"key"}"#, observer(&f.listener))
        .unwrap();
    let first = f.engine.deserialize_mode(&json!({"type": "a"})).unwrap();
    let second = f.engine.deserialize_mode(&json!({"type": "b"})).unwrap();

    f.manager.add_mode(Arc::clone(&first));
    f.manager.add_mode(second);
    assert_eq!(f.engine.context_modes(), vec!["a", "b"]);

    f.manager.remove_mode(&first);
    assert_eq!(f.engine.context_modes(), vec!["b"]);

    f.manager.remove_all_modes();
    assert!(f.engine.context_modes().is_empty());
}

#[test]
fn test_release_disposes_and_detaches() {
    let f = fixture();
    let listener = observer(&f.listener);
    f.manager
        .initialize(r#"{"licenseKey":"key"}"#, Arc::clone(&listener))
        .unwrap();
    f.listener.enable();

    f.manager.release(&listener);

    assert!(!f.manager.is_initialized());
    assert!(f.engine.calls().contains(&"context.dispose".to_string()));
    f.engine.notify_observation_started();
    assert!(f.emitter.events().is_empty());
}

#[test]
fn test_release_without_context_is_noop() {
    let f = fixture();
    f.manager.release(&observer(&f.listener));
    assert!(f.engine.calls().is_empty());
}

#[test]
fn test_with_context() {
    let f = fixture();
    assert!(f.manager.with_context(|_| ()).is_none());

    f.manager
        .initialize(r#"{"licenseKey":"key"}"#, observer(&f.listener))
        .unwrap();
    let applied = f.manager.with_context(|context| {
        context.apply_settings(&serde_json::Map::new());
        true
    });
    assert_eq!(applied, Some(true));
}
