use super::*;

use crate::context::ContextData;
use crate::engine::memory::MemoryEngine;
use crate::engine::CaptureEngine;
use crate::test_support::{overlay, RecordingEmitter, RecordingObserver};
use crate::view::ViewCreationData;

fn log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_attach_is_idempotent() {
    let dispatcher = ObserverDispatcher::new();
    let observer: Arc<dyn LifecycleObserver> = RecordingObserver::new("a", log());

    assert!(dispatcher.attach(Arc::clone(&observer)));
    assert!(!dispatcher.attach(Arc::clone(&observer)));
    assert_eq!(dispatcher.len(), 1);

    assert!(dispatcher.detach(&observer));
    assert!(!dispatcher.detach(&observer));
    assert!(dispatcher.is_empty());
}

#[test]
fn test_dispatch_in_attachment_order() {
    let log = log();
    let dispatcher = ObserverDispatcher::new();
    dispatcher.attach(RecordingObserver::new("a", Arc::clone(&log)));
    dispatcher.attach(RecordingObserver::new("b", Arc::clone(&log)));

    dispatcher.dispatch_context_disposed();
    dispatcher.dispatch_all_modes_removed();
    dispatcher.dispatch_mode_removed("{}");
    dispatcher.dispatch_overlay_removed(&overlay("zoom"));

    assert_eq!(
        entries(&log),
        vec![
            "a:context_disposed",
            "b:context_disposed",
            "a:all_modes_removed",
            "b:all_modes_removed",
            "a:mode_removed",
            "b:mode_removed",
            "a:overlay_removed(zoom)",
            "b:overlay_removed(zoom)",
        ]
    );
}

#[test]
fn test_mode_add_stops_at_first_failure() {
    let log = log();
    let dispatcher = ObserverDispatcher::new();
    dispatcher.attach(RecordingObserver::new("first", Arc::clone(&log)));
    dispatcher.attach(RecordingObserver::failing("second", Arc::clone(&log)));
    dispatcher.attach(RecordingObserver::new("third", Arc::clone(&log)));

    let error = dispatcher.dispatch_mode_add("{}").unwrap_err();

    assert_eq!(entries(&log), vec!["first:mode_add", "second:mode_add"]);
    match error {
        LifecycleError::Rejected { observer, .. } => assert_eq!(observer, "second"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_overlay_add_stops_at_first_failure() {
    let engine = MemoryEngine::new();
    let data = ContextData::from_json(r#"{"licenseKey":"key"}"#).unwrap();
    let mut context = engine.create_context(&data).unwrap();
    let view_data = ViewCreationData::from_json(r#"{"viewId":5}"#).unwrap();
    let view = CaptureView::create(
        &engine,
        context.as_mut(),
        &view_data,
        RecordingEmitter::new(),
        Arc::new(ObserverDispatcher::new()),
    )
    .unwrap();

    let log = log();
    let dispatcher = ObserverDispatcher::new();
    dispatcher.attach(RecordingObserver::new("first", Arc::clone(&log)));
    dispatcher.attach(RecordingObserver::failing("second", Arc::clone(&log)));
    dispatcher.attach(RecordingObserver::new("third", Arc::clone(&log)));

    let error = dispatcher
        .dispatch_overlay_add(r#"{"type":"a"}"#, &view)
        .unwrap_err();

    assert_eq!(
        entries(&log),
        vec!["first:overlay_add(5)", "second:overlay_add(5)"]
    );
    match error {
        LifecycleError::Rejected { observer, .. } => assert_eq!(observer, "second"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_mode_add_without_observers_succeeds() {
    let dispatcher = ObserverDispatcher::new();
    assert!(dispatcher.dispatch_mode_add("{}").is_ok());
}

struct Detacher {
    dispatcher: Arc<ObserverDispatcher>,
    this: Mutex<Option<Arc<dyn LifecycleObserver>>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl LifecycleObserver for Detacher {
    fn on_context_disposed(&self) {
        self.log.lock().unwrap().push("detacher".to_string());
        if let Some(this) = self.this.lock().unwrap().take() {
            self.dispatcher.detach(&this);
        }
    }
}

#[test]
fn test_observer_may_detach_during_dispatch() {
    let log = log();
    let dispatcher = Arc::new(ObserverDispatcher::new());
    let detacher = Arc::new(Detacher {
        dispatcher: Arc::clone(&dispatcher),
        this: Mutex::new(None),
        log: Arc::clone(&log),
    });
    let as_observer: Arc<dyn LifecycleObserver> = detacher.clone();
    *detacher.this.lock().unwrap() = Some(Arc::clone(&as_observer));

    dispatcher.attach(as_observer);
    dispatcher.attach(RecordingObserver::new("after", Arc::clone(&log)));

    dispatcher.dispatch_context_disposed();
    dispatcher.dispatch_context_disposed();

    assert_eq!(
        entries(&log),
        vec!["detacher", "after:context_disposed", "after:context_disposed"]
    );
    assert_eq!(dispatcher.len(), 1);
}
