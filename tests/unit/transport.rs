use super::*;

use serde_json::json;
use tokio::io::AsyncReadExt;

use crate::core_module::CoreModule;
use crate::engine::memory::MemoryEngine;
use crate::event::{CONTEXT_STATUS_CHANGED, FRAME_SOURCE_STATE_CHANGED, VIEW_SIZE_CHANGED};
use crate::lifecycle::ObserverDispatcher;
use crate::runtime::MainThread;

struct Harness {
    bridge: Arc<Bridge>,
    emitter: Arc<ChannelEmitter>,
    engine: Arc<MemoryEngine>,
    rx: OutboundReceiver,
}

impl Harness {
    fn new() -> Self {
        let (tx, rx) = channel();
        let emitter = Arc::new(ChannelEmitter::new(tx.clone()));
        let engine = Arc::new(MemoryEngine::new());
        let main_thread = Arc::new(MainThread::spawn("transport-test-main").unwrap());
        let core = CoreModule::new(
            engine.clone(),
            emitter.clone(),
            main_thread,
            Arc::new(ObserverDispatcher::new()),
        );
        let locator = Arc::new(ModuleLocator::new());
        locator.register(core).unwrap();

        let bridge = Arc::new(Bridge::new(locator, Arc::clone(&emitter), tx));
        bridge.start();
        Self {
            bridge,
            emitter,
            engine,
            rx,
        }
    }

    fn call(&self, id: i64, method: &str, arguments: Value) {
        let line = json!({ "id": id, "method": method, "arguments": arguments }).to_string();
        self.bridge.handle_line(&line);
    }

    fn next(&mut self) -> Value {
        match self.rx.try_recv() {
            Ok(Outbound::Message(message)) => message,
            other => panic!("expected an outbound message, got {other:?}"),
        }
    }

    fn drain(&mut self) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(Outbound::Message(message)) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

#[test]
fn test_malformed_request_is_rejected_with_null_id() {
    let mut h = Harness::new();
    h.bridge.handle_line("{not json");

    let reply = h.next();
    assert_eq!(reply["id"], Value::Null);
    assert_eq!(reply["error"]["code"], "DESERIALIZATION_ERROR");
    assert_eq!(reply["error"]["details"], json!({"errorCode": 3}));
}

#[test]
fn test_unknown_module_and_method() {
    let mut h = Harness::new();

    h.bridge.handle_line(r#"{"id":1,"module":"NoSuchModule","method":"getDefaults"}"#);
    let reply = h.next();
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["error"]["code"], UNIMPLEMENTED_METHOD);
    assert_eq!(
        reply["error"]["message"],
        "Module 'NoSuchModule' is not registered"
    );

    h.call(2, "frobnicate", json!({}));
    let reply = h.next();
    assert_eq!(reply["id"], 2);
    assert_eq!(reply["error"]["code"], UNIMPLEMENTED_METHOD);
    assert_eq!(reply["error"]["message"], "Method 'frobnicate' is not implemented");
}

#[test]
fn test_request_id_is_echoed() {
    let mut h = Harness::new();
    h.bridge
        .handle_line(r#"{"id":"abc","module":"CoreModule","method":"getDefaults"}"#);

    let reply = h.next();
    assert_eq!(reply["id"], "abc");
    assert!(reply["ok"].get("Camera").is_some());
    assert!(reply.get("error").is_none());
}

#[test]
fn test_missing_parameter() {
    let mut h = Harness::new();
    h.call(3, "createContextFromJson", json!({}));

    let reply = h.next();
    assert_eq!(reply["error"]["code"], crate::core::MISSING_PARAMETER);
}

#[test]
fn test_context_and_camera_over_the_wire() {
    let mut h = Harness::new();
    h.call(
        1,
        "createContextFromJson",
        json!({
            "contextJson": {
                "licenseKey": "abc",
                "frameSource": {"type": "camera", "position": "worldFacing", "desiredState": "on"},
            }
        }),
    );
    assert_eq!(h.next(), json!({"id": 1, "ok": null}));

    h.call(2, "getCameraState", json!({"cameraPosition": "worldFacing"}));
    assert_eq!(h.next(), json!({"id": 2, "ok": "on"}));

    h.call(3, "disposeContext", json!({}));
    assert_eq!(h.next(), json!({"id": 3, "ok": null}));

    h.call(4, "getCameraState", json!({"cameraPosition": "worldFacing"}));
    assert_eq!(h.next()["error"]["code"], "CAMERA_NOT_READY");
}

#[test]
fn test_listener_commands_subscribe_the_emitter() {
    let mut h = Harness::new();
    assert!(!h.emitter.has_listener(CONTEXT_STATUS_CHANGED));

    h.call(1, "createContextFromJson", json!({"contextJson": {"licenseKey": "abc"}}));
    h.call(2, "subscribeContextListener", json!({}));
    assert!(h.emitter.has_listener(CONTEXT_STATUS_CHANGED));
    h.drain();

    h.engine.notify_status(&json!({"code": 260}));
    assert_eq!(
        h.next(),
        json!({
            "event": CONTEXT_STATUS_CHANGED,
            "payload": {"status": {"code": 260}},
        })
    );

    h.call(3, "unsubscribeContextListener", json!({}));
    assert!(!h.emitter.has_listener(CONTEXT_STATUS_CHANGED));
    h.drain();
    h.engine.notify_status(&json!({"code": 261}));
    assert!(h.drain().is_empty());
}

#[test]
fn test_view_subscriptions_are_per_view() {
    let (tx, _rx) = channel();
    let emitter = ChannelEmitter::new(tx);

    emitter.subscribe_view(7, &[VIEW_SIZE_CHANGED]);
    assert!(emitter.has_view_specific_listeners(7, VIEW_SIZE_CHANGED));
    assert!(!emitter.has_view_specific_listeners(8, VIEW_SIZE_CHANGED));
    assert!(!emitter.has_listener(VIEW_SIZE_CHANGED));

    emitter.unsubscribe_view(7, &[VIEW_SIZE_CHANGED]);
    assert!(!emitter.has_view_specific_listeners(7, VIEW_SIZE_CHANGED));
}

#[test]
fn test_channel_result_forwards_registrations() {
    let (tx, mut rx) = channel();
    let emitter = Arc::new(ChannelEmitter::new(tx.clone()));
    let result = ChannelResult::new(json!(9), tx, Arc::clone(&emitter));

    result.register_callback_for_events(&[FRAME_SOURCE_STATE_CHANGED]);
    assert!(emitter.has_listener(FRAME_SOURCE_STATE_CHANGED));
    result.unregister_callback_for_events(&[FRAME_SOURCE_STATE_CHANGED]);
    assert!(!emitter.has_listener(FRAME_SOURCE_STATE_CHANGED));

    result.reject("CODE", "went wrong", None);
    match rx.try_recv() {
        Ok(Outbound::Message(message)) => assert_eq!(
            message,
            json!({"id": 9, "error": {"code": "CODE", "message": "went wrong", "details": null}})
        ),
        other => panic!("expected a reply, got {other:?}"),
    }
}

#[test]
fn test_stop_disposes_the_context() {
    let h = Harness::new();
    h.call(1, "createContextFromJson", json!({"contextJson": {"licenseKey": "abc"}}));

    h.bridge.stop();

    assert!(h.bridge.locator().names().is_empty());
    assert!(h.engine.calls().contains(&"context.dispose".to_string()));
}

#[test]
fn test_serve_replies_in_order_and_drains_on_eof() {
    let h = Harness::new();
    let Harness { bridge, engine, rx, .. } = h;
    let input = concat!(
        r#"{"id":1,"method":"createContextFromJson","arguments":{"contextJson":"{\"licenseKey\":\"abc\"}"}}"#,
        "\n",
        "\n",
        r#"{"id":2,"method":"getOpenSourceSoftwareLicenseInfo"}"#,
        "\n",
        "garbage\n",
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let output = runtime.block_on(async move {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        serve(bridge, rx, input.as_bytes(), server).await.unwrap();
        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        output
    });

    let replies: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0], json!({"id": 1, "ok": null}));
    assert_eq!(replies[1]["id"], 2);
    assert!(replies[1]["ok"].is_string());
    assert_eq!(replies[2]["error"]["code"], "DESERIALIZATION_ERROR");
    assert_eq!(engine.calls().last().map(String::as_str), Some("context.dispose"));
}
