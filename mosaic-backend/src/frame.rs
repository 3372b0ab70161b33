//! Per-frame polling tasks.
//!
//! Some native state has no change notification (the native edit view's
//! cursor position, for one) and must be sampled once per toolkit paint
//! pass. Tasks registered here run at the top of every frame and
//! deregister themselves by returning `false`.

use parking_lot::Mutex;

type PollTask = Box<dyn FnMut() -> bool + Send>;

/// Registry of tasks polled once per frame.
#[derive(Default)]
pub struct FramePoller {
    tasks: Mutex<Vec<PollTask>>,
}

impl FramePoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task. It runs every frame until it returns `false`.
    pub fn register(&self, task: impl FnMut() -> bool + Send + 'static) {
        self.tasks.lock().push(Box::new(task));
    }

    /// Runs all registered tasks, dropping those that return `false`.
    pub fn run_frame(&self) {
        // Tasks run outside the registry lock so they may register
        // successors without deadlocking.
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        tasks.retain_mut(|task| task());
        self.tasks.lock().append(&mut tasks);
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn test_task_runs_every_frame_until_done() {
        let poller = FramePoller::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        poller.register(move || counter.fetch_add(1, Ordering::SeqCst) < 2);
        poller.run_frame();
        poller.run_frame();
        poller.run_frame();
        poller.run_frame();
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(poller.is_empty());
    }

    #[test]
    fn test_task_may_register_successor() {
        let poller = Arc::new(FramePoller::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let outer_runs = runs.clone();
        let registry = poller.clone();
        poller.register(move || {
            outer_runs.fetch_add(1, Ordering::SeqCst);
            let inner_runs = outer_runs.clone();
            registry.register(move || {
                inner_runs.fetch_add(10, Ordering::SeqCst);
                false
            });
            false
        });
        poller.run_frame();
        poller.run_frame();
        assert_eq!(runs.load(Ordering::SeqCst), 11);
        assert!(poller.is_empty());
    }
}
