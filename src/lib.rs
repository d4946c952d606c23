//! scanbridge - bridge layer between a host framework and a native capture
//! engine.
//!
//! Module layout:
//! - core: error taxonomy, listener flag, identifier registry
//! - engine: ports onto the capture engine plus an in-memory implementation
//! - command / method / result: method calls in, replies out
//! - context / frame_source / view / frames: the objects the bridge owns
//! - lifecycle / module: cross-module observers and the module locator
//! - core_module: the operations behind every core command
//! - runtime / transport: threads, the tokio runtime and the stdio protocol

pub mod command;
pub mod config;
pub mod context;
pub mod core;
pub mod core_module;
pub mod engine;
pub mod event;
pub mod frame_source;
pub mod frames;
pub mod lifecycle;
pub mod listener;
pub mod method;
pub mod module;
pub mod result;
pub mod runtime;
pub mod transport;
pub mod view;
