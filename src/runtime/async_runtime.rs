use std::future::Future;
use std::io;

/// Tokio runtime driving the transport. Commands themselves never run on it
/// directly; they go to the blocking pool or the main thread.
pub struct AsyncRuntime {
    runtime: tokio::runtime::Runtime,
}

impl AsyncRuntime {
    pub fn new(worker_threads: Option<usize>) -> io::Result<Self> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if let Some(threads) = worker_threads.filter(|threads| *threads > 0) {
            builder.worker_threads(threads);
        }
        let runtime = builder
            .thread_name("scanbridge-worker")
            .enable_all()
            .build()
            .or_else(|e| {
                tracing::error!(
                    error = %e,
                    "Failed to create multi-thread tokio runtime, falling back to current-thread"
                );
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
            })?;
        Ok(Self { runtime })
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/async_runtime.rs"]
mod tests;
