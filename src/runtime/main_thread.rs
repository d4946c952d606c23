//! The designated thread for view and context mutations.
//!
//! One named worker drains a FIFO queue, so everything submitted through a
//! `MainThread` runs in submission order. Submitting from the worker itself
//! runs the job inline instead of queueing it, which keeps a job that
//! dispatches synchronously from deadlocking on itself.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, SendError, Sender};
use std::thread::{self, JoinHandle, ThreadId};

type Job = Box<dyn FnOnce() + Send + 'static>;
type Outcome<R> = std::result::Result<R, Box<dyn Any + Send + 'static>>;

pub struct MainThread {
    sender: Option<Sender<Job>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl MainThread {
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for job in receiver {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("main thread job panicked");
                    }
                }
            })?;
        Ok(Self {
            sender: Some(sender),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn submit(&self, job: Job) -> std::result::Result<(), Job> {
        match &self.sender {
            Some(sender) => sender.send(job).map_err(|SendError(job)| job),
            None => Err(job),
        }
    }

    /// Queues `job` and returns immediately.
    pub fn dispatch_async(&self, job: impl FnOnce() + Send + 'static) {
        if self.is_current() {
            job();
            return;
        }
        if self.submit(Box::new(job)).is_err() {
            tracing::warn!("main thread is gone, dropping job");
        }
    }

    /// Runs `job` on the main thread and waits for its result. A panic in
    /// `job` is resumed on the calling thread. Returns `None` when the job
    /// was dropped without running.
    pub fn dispatch_sync<R: Send + 'static>(
        &self,
        job: impl FnOnce() -> R + Send + 'static,
    ) -> Option<R> {
        if self.is_current() {
            return Some(job());
        }

        let (done_tx, done_rx) = mpsc::sync_channel::<Outcome<R>>(1);
        let wrapped: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job));
            let _ = done_tx.send(outcome);
        });
        if let Err(wrapped) = self.submit(wrapped) {
            tracing::warn!("main thread is gone, running job on the caller");
            wrapped();
        }

        await_outcome(&done_rx)
    }
}

fn await_outcome<R>(done_rx: &mpsc::Receiver<Outcome<R>>) -> Option<R> {
    match done_rx.recv() {
        Ok(Ok(value)) => Some(value),
        Ok(Err(payload)) => panic::resume_unwind(payload),
        Err(_) => {
            tracing::error!("main thread dropped a synchronous job without running it");
            None
        }
    }
}

impl Drop for MainThread {
    /// Lets the worker finish what is queued, then joins it.
    fn drop(&mut self) {
        self.sender.take();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if self.is_current() {
            return;
        }
        if handle.join().is_err() {
            tracing::error!("main thread exited with a panic");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/main_thread.rs"]
mod tests;
