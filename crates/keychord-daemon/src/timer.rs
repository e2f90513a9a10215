//! One-shot timer backed by the tokio runtime
//!
//! Callbacks run as local tasks, so this timer must be used from inside a
//! [`tokio::task::LocalSet`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use keychord::{Timer, TimerCallback, TimerId};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct TokioTimer {
    next_id: Cell<u64>,
    tasks: Rc<RefCell<HashMap<u64, JoinHandle<()>>>>,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks that are scheduled and have not fired yet.
    pub fn pending_count(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl Timer for TokioTimer {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let tasks = Rc::clone(&self.tasks);
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            tasks.borrow_mut().remove(&id);
            callback();
        });
        self.tasks.borrow_mut().insert(id, handle);

        TimerId::new(id)
    }

    fn cancel(&self, id: TimerId) {
        if let Some(handle) = self.tasks.borrow_mut().remove(&id.raw()) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.borrow_mut().drain() {
            handle.abort();
        }
    }
}
