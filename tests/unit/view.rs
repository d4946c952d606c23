use super::*;

use serde_json::json;

use crate::context::ContextData;
use crate::engine::memory::MemoryEngine;
use crate::engine::Size;
use crate::event::VIEW_SIZE_CHANGED;
use crate::test_support::{overlay, RecordingEmitter, RecordingObserver};

struct Fixture {
    engine: MemoryEngine,
    context: Box<dyn EngineContext>,
    emitter: Arc<RecordingEmitter>,
    dispatcher: Arc<ObserverDispatcher>,
    log: Arc<Mutex<Vec<String>>>,
}

fn fixture() -> Fixture {
    let engine = MemoryEngine::new();
    let data = ContextData::from_json(r#"{"licenseKey":"key"}"#).unwrap();
    let context = engine.create_context(&data).unwrap();
    let dispatcher = Arc::new(ObserverDispatcher::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.attach(RecordingObserver::new("obs", Arc::clone(&log)));
    Fixture {
        engine,
        context,
        emitter: RecordingEmitter::new(),
        dispatcher,
        log,
    }
}

fn create(f: &mut Fixture, json: &str) -> CaptureView {
    let data = ViewCreationData::from_json(json).unwrap();
    CaptureView::create(
        &f.engine,
        f.context.as_mut(),
        &data,
        f.emitter.clone(),
        Arc::clone(&f.dispatcher),
    )
    .unwrap()
}

#[test]
fn test_creation_data_splits_overlays() {
    let data = ViewCreationData::from_json(
        r#"{"viewId":7,"parentId":3,"scanAreaMargins":{},"overlays":[{"type":"a"},{"type":"b"}]}"#,
    )
    .unwrap();

    assert_eq!(data.view_id, 7);
    assert_eq!(data.parent_id, Some(3));
    assert_eq!(data.overlays, vec![r#"{"type":"a"}"#, r#"{"type":"b"}"#]);
    assert!(data.view_json.get("overlays").is_none());
    assert_eq!(data.view_json.get("scanAreaMargins"), Some(&json!({})));
}

#[test]
fn test_creation_data_defaults() {
    let data = ViewCreationData::from_json("{}").unwrap();
    assert_eq!(data.view_id, 0);
    assert_eq!(data.parent_id, None);
    assert!(data.overlays.is_empty());
}

#[test]
fn test_creation_data_rejects_malformed() {
    let error = ViewCreationData::from_json("{viewId").unwrap_err();
    assert_eq!(error.code(), "DESERIALIZATION_ERROR");

    let error = ViewCreationData::from_json("[1, 2]").unwrap_err();
    assert_eq!(error.to_string(), "unable to deserialize the following JSON: [1, 2]");
}

#[test]
fn test_overlays_add_and_remove() {
    let mut f = fixture();
    let view = create(&mut f, r#"{"viewId":1}"#);
    let first = overlay("barcode");
    let second = overlay("label");

    view.add_overlay(Arc::clone(&first));
    view.add_overlay(Arc::clone(&second));
    assert_eq!(f.engine.view_overlays(), vec![vec!["barcode", "label"]]);
    assert!(view.find_overlay("label").is_some());
    assert!(view.find_overlay("missing").is_none());

    assert!(view.remove_overlay(&first));
    assert!(!view.remove_overlay(&first));
    assert!(!view.remove_overlay(&overlay("barcode")));

    assert_eq!(view.overlays().len(), 1);
    assert_eq!(*f.log.lock().unwrap(), vec!["obs:overlay_removed(barcode)"]);
}

#[test]
fn test_size_listener() {
    let mut f = fixture();
    let view = create(&mut f, r#"{"viewId":5}"#);
    assert!(view.is_listener_enabled());

    f.engine.resize_views(
        Size {
            width: 10.0,
            height: 20.0,
        },
        "portrait",
    );
    view.disable_listener();
    f.engine.resize_views(Size::default(), "portrait");
    view.enable_listener();
    f.engine.resize_views(Size::default(), "landscapeRight");

    let events = f.emitter.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, VIEW_SIZE_CHANGED);
    assert_eq!(events[0].1["viewId"], json!(5));
    assert_eq!(events[1].1["orientation"], json!("landscapeRight"));
}

#[test]
fn test_update_and_mapping() {
    let mut f = fixture();
    let view = create(&mut f, r#"{"viewId":1}"#);

    view.update(&json!({"pointOfInterest": {"x": 0.5, "y": 0.5}})).unwrap();
    assert!(view.update(&json!([1])).is_err());

    let point = Point { x: 3.0, y: 4.0 };
    assert_eq!(view.view_point_for_frame_point(point), Some(point));
    let quad = Quadrilateral::default();
    assert_eq!(view.view_quadrilateral_for_frame_quadrilateral(quad), Some(quad));
}

#[test]
fn test_dispose_is_idempotent() {
    let mut f = fixture();
    let view = create(&mut f, r#"{"viewId":2,"parentId":9}"#);
    view.add_overlay(overlay("barcode"));

    view.dispose();
    view.dispose();

    assert!(view.is_disposed());
    assert!(view.overlays().is_empty());
    assert!(!view.is_listener_enabled());
    let removals = f
        .engine
        .calls()
        .iter()
        .filter(|call| call.as_str() == "view.remove_from_parent")
        .count();
    assert_eq!(removals, 1);
    assert_eq!(*f.log.lock().unwrap(), vec!["obs:overlay_removed(barcode)"]);
    assert_eq!(view.parent_id(), Some(9));
}

#[test]
fn test_disposed_view_rejects_work() {
    let mut f = fixture();
    let view = create(&mut f, r#"{"viewId":3}"#);
    view.dispose();

    let error = view.update(&json!({})).unwrap_err();
    assert_eq!(error.code(), "NIL_DATA_CAPTURE_VIEW");
    assert_eq!(view.view_point_for_frame_point(Point::default()), None);

    f.engine.resize_views(Size::default(), "portrait");
    assert!(f.emitter.events().is_empty());
}
