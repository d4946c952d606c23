//! Newline-delimited JSON over a byte stream.
//!
//! Requests look like `{"id": 1, "module": "CoreModule", "method": "...",
//! "arguments": {...}}`; `module` defaults to the core module. Every request
//! gets exactly one reply, `{"id", "ok"}` or `{"id", "error"}`. Events go
//! out as `{"event", "payload"}` for names a command subscribed to.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::{CoreError, UNIMPLEMENTED_METHOD};
use crate::core_module::CORE_MODULE_NAME;
use crate::event::Emitter;
use crate::method::JsonMethodCall;
use crate::module::ModuleLocator;
use crate::result::ResultSink;

#[derive(Debug)]
pub enum Outbound {
    Message(Value),
    Shutdown,
}

pub type OutboundSender = UnboundedSender<Outbound>;
pub type OutboundReceiver = UnboundedReceiver<Outbound>;

pub fn channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}

fn send(tx: &OutboundSender, message: Value) {
    if tx.send(Outbound::Message(message)).is_err() {
        tracing::warn!("outbound channel closed, dropping message");
    }
}

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(flatten)]
    pub call: JsonMethodCall,
}

#[derive(Default)]
struct Subscriptions {
    events: FxHashSet<String>,
    view_events: FxHashSet<(i64, String)>,
}

/// Emits only events some command subscribed to.
pub struct ChannelEmitter {
    tx: OutboundSender,
    subscriptions: Mutex<Subscriptions>,
}

impl ChannelEmitter {
    pub fn new(tx: OutboundSender) -> Self {
        Self {
            tx,
            subscriptions: Mutex::new(Subscriptions::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Subscriptions> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, names: &[&str]) {
        let mut subscriptions = self.lock();
        for name in names {
            subscriptions.events.insert(name.to_string());
        }
    }

    pub fn unsubscribe(&self, names: &[&str]) {
        let mut subscriptions = self.lock();
        for name in names {
            subscriptions.events.remove(*name);
        }
    }

    pub fn subscribe_view(&self, view_id: i64, names: &[&str]) {
        let mut subscriptions = self.lock();
        for name in names {
            subscriptions.view_events.insert((view_id, name.to_string()));
        }
    }

    pub fn unsubscribe_view(&self, view_id: i64, names: &[&str]) {
        let mut subscriptions = self.lock();
        for name in names {
            subscriptions.view_events.remove(&(view_id, name.to_string()));
        }
    }
}

impl Emitter for ChannelEmitter {
    fn emit(&self, name: &str, payload: Value) {
        send(&self.tx, json!({ "event": name, "payload": payload }));
    }

    fn has_listener(&self, name: &str) -> bool {
        self.lock().events.contains(name)
    }

    fn has_view_specific_listeners(&self, view_id: i64, name: &str) -> bool {
        self.lock()
            .view_events
            .contains(&(view_id, name.to_string()))
    }
}

/// Replies to a single request.
pub struct ChannelResult {
    id: Value,
    tx: OutboundSender,
    emitter: Arc<ChannelEmitter>,
}

impl ChannelResult {
    pub fn new(id: Value, tx: OutboundSender, emitter: Arc<ChannelEmitter>) -> Self {
        Self { id, tx, emitter }
    }
}

impl ResultSink for ChannelResult {
    fn success(&self, value: Value) {
        send(&self.tx, json!({ "id": self.id, "ok": value }));
    }

    fn reject(&self, code: &str, message: &str, details: Option<Value>) {
        send(
            &self.tx,
            json!({
                "id": self.id,
                "error": { "code": code, "message": message, "details": details },
            }),
        );
    }

    fn register_callback_for_events(&self, names: &[&str]) {
        self.emitter.subscribe(names);
    }

    fn unregister_callback_for_events(&self, names: &[&str]) {
        self.emitter.unsubscribe(names);
    }

    fn register_view_specific_callback(&self, view_id: i64, names: &[&str]) {
        self.emitter.subscribe_view(view_id, names);
    }

    fn unregister_view_specific_callback(&self, view_id: i64, names: &[&str]) {
        self.emitter.unsubscribe_view(view_id, names);
    }
}

pub struct Bridge {
    locator: Arc<ModuleLocator>,
    emitter: Arc<ChannelEmitter>,
    tx: OutboundSender,
}

impl Bridge {
    pub fn new(locator: Arc<ModuleLocator>, emitter: Arc<ChannelEmitter>, tx: OutboundSender) -> Self {
        Self {
            locator,
            emitter,
            tx,
        }
    }

    pub fn locator(&self) -> &Arc<ModuleLocator> {
        &self.locator
    }

    fn result_for(&self, id: Value) -> Arc<dyn ResultSink> {
        Arc::new(ChannelResult::new(
            id,
            self.tx.clone(),
            Arc::clone(&self.emitter),
        ))
    }

    pub fn start(&self) {
        for name in self.locator.names() {
            if let Some(module) = self.locator.resolve(name) {
                module.did_start();
            }
        }
    }

    pub fn stop(&self) {
        for module in self.locator.remove_all() {
            module.did_stop();
        }
    }

    /// Parses and runs one request line. Returns once the command has run;
    /// asynchronous commands may still reply later.
    pub fn handle_line(&self, line: &str) {
        let request = match serde_json::from_str::<Request>(line) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(%error, "malformed request");
                self.result_for(Value::Null)
                    .reject_error(&CoreError::invalid_json(line));
                return;
            }
        };
        self.handle(request);
    }

    pub fn handle(&self, request: Request) {
        let Request { id, module, call } = request;
        let result = self.result_for(id);
        let module_name = module.as_deref().unwrap_or(CORE_MODULE_NAME);

        let Some(module) = self.locator.resolve(module_name) else {
            tracing::warn!(module = module_name, "unknown module");
            result.reject(
                UNIMPLEMENTED_METHOD,
                &format!("Module '{module_name}' is not registered"),
                None,
            );
            return;
        };
        let Some(command) = module.create_command(&call) else {
            tracing::warn!(module = module_name, method = %call.method, "unknown method");
            result.reject(
                UNIMPLEMENTED_METHOD,
                &format!("Method '{}' is not implemented", call.method),
                None,
            );
            return;
        };
        tracing::debug!(module = module_name, method = command.method(), "dispatching");
        command.execute(result);
    }

    pub fn shutdown(&self) {
        if self.tx.send(Outbound::Shutdown).is_err() {
            tracing::debug!("outbound channel already closed");
        }
    }
}

async fn write_outbound<W>(mut rx: OutboundReceiver, writer: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = tokio::io::BufWriter::new(writer);
    while let Some(outbound) = rx.recv().await {
        let message = match outbound {
            Outbound::Message(message) => message,
            Outbound::Shutdown => break,
        };
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    writer.flush().await
}

/// Reads requests until EOF, running each on the blocking pool in arrival
/// order, then stops every module and drains pending output.
pub async fn serve<R, W>(bridge: Arc<Bridge>, rx: OutboundReceiver, reader: R, writer: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer_task = tokio::spawn(write_outbound(rx, writer));

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let bridge = Arc::clone(&bridge);
        if let Err(error) = tokio::task::spawn_blocking(move || bridge.handle_line(&line)).await {
            tracing::error!(%error, "request handler failed");
        }
    }

    tracing::info!("input closed, stopping modules");
    let stopping = Arc::clone(&bridge);
    if let Err(error) = tokio::task::spawn_blocking(move || stopping.stop()).await {
        tracing::error!(%error, "module shutdown failed");
    }
    bridge.shutdown();

    match writer_task.await {
        Ok(result) => result,
        Err(error) => Err(io::Error::other(error)),
    }
}

#[cfg(test)]
#[path = "../tests/unit/transport.rs"]
mod tests;
