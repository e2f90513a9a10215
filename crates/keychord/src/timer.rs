//! Timer facility seam
//!
//! The controller needs "run this once after a delay, cancellable" for its
//! idle clear. Hosts plug in their own event loop through [`Timer`];
//! [`ManualTimer`] is a virtual clock driven by explicit [`ManualTimer::advance`]
//! calls, for hosts that tick their own loop and for tests.

use std::cell::RefCell;
use std::time::{Duration, Instant};

/// Callback run when a scheduled timer fires.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Handle for a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One-shot, cancellable scheduling.
///
/// Implementations must never run a callback from inside `schedule` or
/// `cancel`; callbacks run later, from the host's event loop.
pub trait Timer {
    /// Current time on this timer's clock.
    fn now(&self) -> Instant;

    /// Run `callback` once after `delay`.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Cancel a scheduled callback. Unknown or already fired ids are ignored.
    fn cancel(&self, id: TimerId);
}

struct Pending {
    id: TimerId,
    deadline: Duration,
    callback: TimerCallback,
}

struct ManualState {
    elapsed: Duration,
    next_id: u64,
    pending: Vec<Pending>,
}

/// Virtual-clock timer. Time only moves on [`ManualTimer::advance`].
pub struct ManualTimer {
    origin: Instant,
    state: RefCell<ManualState>,
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTimer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: RefCell::new(ManualState {
                elapsed: Duration::ZERO,
                next_id: 0,
                pending: Vec::new(),
            }),
        }
    }

    /// Move the clock forward by `by`, firing every callback that falls due,
    /// earliest first. Callbacks may schedule or cancel further timers.
    pub fn advance(&self, by: Duration) {
        let target = self.state.borrow().elapsed + by;

        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.deadline <= target)
                    .min_by_key(|(_, p)| (p.deadline, p.id.raw()))
                    .map(|(index, _)| index);

                match next {
                    Some(index) => {
                        let pending = state.pending.remove(index);
                        state.elapsed = pending.deadline;
                        Some(pending.callback)
                    }
                    None => None,
                }
            };

            match due {
                Some(callback) => callback(),
                None => break,
            }
        }

        self.state.borrow_mut().elapsed = target;
    }

    /// Number of callbacks still waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> Instant {
        self.origin + self.state.borrow().elapsed
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let deadline = state.elapsed + delay;
        state.pending.push(Pending {
            id,
            deadline,
            callback,
        });
        id
    }

    fn cancel(&self, id: TimerId) {
        self.state.borrow_mut().pending.retain(|p| p.id != id);
    }
}
