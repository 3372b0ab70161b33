//! Cross-context task dispatch.
//!
//! Two scheduling contexts exist in the binding: the toolkit's own
//! single-threaded event/paint loop (owned by [`ToolkitThread`]) and the
//! host OS UI thread (reached through the [`UiDispatcher`] trait). All
//! cross-context handoff goes through exactly two primitives:
//!
//! - [`ToolkitHandle::invoke_later`] / [`UiDispatcher::post`] for
//!   fire-and-forget marshaling, and
//! - [`post_and_wait`] / [`ToolkitHandle::invoke_and_wait`] for blocking
//!   rendezvous.
//!
//! The rendezvous primitive carries the binding's one deadlock-avoidance
//! convention: a task posted to the other context must never synchronously
//! re-enter the posting context. Centralizing the wait here keeps that
//! convention in one place instead of scattered wait/notify pairs.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle, ThreadId},
};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use tracing::{error, warn};

use crate::{error::BindingError, thread_utils};

/// A unit of work marshaled across a context boundary.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Invoked with the panic message when a toolkit task panics.
///
/// The binding wires this to the host's blocking error dialog; the task
/// loop resumes once the callback returns.
pub type PanicSink = Arc<dyn Fn(&str) + Send + Sync>;

/// The host OS UI thread, reduced to the one capability the binding needs.
///
/// Implementations enqueue the task onto the platform's UI looper. Tasks
/// must eventually run; ordering follows the platform queue.
pub trait UiDispatcher: Send + Sync {
    /// Enqueues a task on the OS UI thread and returns immediately.
    fn post(&self, task: Task);
}

/// Posts `f` to the UI thread and blocks until it has run, returning its
/// result.
///
/// This is the single "run on UI thread and await completion" primitive
/// used for native view creation, focus requests, clipboard access and
/// native dialogs. Never call back into the toolkit thread synchronously
/// from inside `f`: the toolkit thread may be the one waiting here.
pub fn post_and_wait<R, F>(ui: &dyn UiDispatcher, f: F) -> R
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    let (tx, rx) = bounded(1);
    ui.post(Box::new(move || {
        // A dropped sender (panicked task) unblocks the receiver below.
        let _ = tx.send(f());
    }));
    rx.recv().expect("UI task dropped without completing")
}

enum ToolkitMessage {
    Task(Task),
    Shutdown,
}

/// The toolkit's single-threaded serialized event loop.
///
/// All toolkit component state is owned by this thread; writes originating
/// from native callbacks must be marshaled here via
/// [`ToolkitHandle::invoke_later`], never performed synchronously on the
/// callback thread.
pub struct ToolkitThread {
    handle: ToolkitHandle,
    join: Option<JoinHandle<()>>,
}

/// Cloneable sender half of the toolkit task queue.
#[derive(Clone)]
pub struct ToolkitHandle {
    sender: Sender<ToolkitMessage>,
    thread_id: ThreadId,
}

impl ToolkitThread {
    /// Spawns the toolkit thread.
    ///
    /// `panic_sink` receives the message of any panicking task; the loop
    /// resumes after the sink returns (the panic is not rethrown).
    pub fn spawn(panic_sink: PanicSink) -> Self {
        let (sender, receiver) = unbounded();
        let (id_tx, id_rx) = bounded(1);
        let join = thread::Builder::new()
            .name("mosaic-toolkit".into())
            .spawn(move || {
                thread_utils::set_thread_name("mosaic-toolkit");
                let _ = id_tx.send(thread::current().id());
                Self::run_loop(receiver, panic_sink);
            })
            .expect("failed to spawn toolkit thread");
        let thread_id = id_rx.recv().expect("toolkit thread failed to start");
        Self {
            handle: ToolkitHandle { sender, thread_id },
            join: Some(join),
        }
    }

    fn run_loop(receiver: Receiver<ToolkitMessage>, panic_sink: PanicSink) {
        while let Ok(message) = receiver.recv() {
            let task = match message {
                ToolkitMessage::Task(task) => task,
                ToolkitMessage::Shutdown => break,
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown toolkit error".to_string());
                error!("toolkit task panicked: {message}");
                panic_sink(&message);
            }
        }
    }

    /// A cloneable handle for enqueueing work.
    pub fn handle(&self) -> ToolkitHandle {
        self.handle.clone()
    }

    /// Stops the loop after all queued tasks have drained, and joins.
    pub fn shutdown(mut self) {
        let _ = self.handle.sender.send(ToolkitMessage::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for ToolkitThread {
    fn drop(&mut self) {
        let _ = self.handle.sender.send(ToolkitMessage::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl ToolkitHandle {
    /// True when called from the toolkit thread itself.
    pub fn is_toolkit_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Enqueues `f` on the toolkit thread, fire-and-forget.
    pub fn invoke_later(&self, f: impl FnOnce() + Send + 'static) {
        if self
            .sender
            .send(ToolkitMessage::Task(Box::new(f)))
            .is_err()
        {
            warn!("toolkit queue closed; task dropped");
        }
    }

    /// Runs `f` on the toolkit thread and blocks until it completes.
    ///
    /// When called from the toolkit thread itself, `f` runs inline, so the
    /// queue cannot service a task while its own loop is blocked here.
    pub fn invoke_and_wait<R, F>(&self, f: F) -> Result<R, BindingError>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_toolkit_thread() {
            return Ok(f());
        }
        let (tx, rx) = bounded(1);
        self.sender
            .send(ToolkitMessage::Task(Box::new(move || {
                let _ = tx.send(f());
            })))
            .map_err(|_| BindingError::ToolkitStopped)?;
        rx.recv().map_err(|_| BindingError::ToolkitStopped)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! A UI "thread" backed by a plain worker draining a channel.

    use std::sync::{Arc, Mutex};

    use super::*;

    pub(crate) struct TestUiThread {
        sender: Sender<Option<Task>>,
        join: Mutex<Option<JoinHandle<()>>>,
    }

    impl TestUiThread {
        pub(crate) fn start() -> Arc<Self> {
            let (sender, receiver) = unbounded::<Option<Task>>();
            let join = thread::spawn(move || {
                while let Ok(Some(task)) = receiver.recv() {
                    task();
                }
            });
            Arc::new(Self {
                sender,
                join: Mutex::new(Some(join)),
            })
        }

        pub(crate) fn stop(&self) {
            let _ = self.sender.send(None);
            if let Some(join) = self.join.lock().expect("join lock").take() {
                let _ = join.join();
            }
        }
    }

    impl UiDispatcher for TestUiThread {
        fn post(&self, task: Task) {
            let _ = self.sender.send(Some(task));
        }
    }
}
