//! Threads the bridge runs on.

mod async_runtime;
mod main_thread;

pub use async_runtime::AsyncRuntime;
pub use main_thread::MainThread;
