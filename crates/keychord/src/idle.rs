//! Idle clear bookkeeping
//!
//! Keeps at most one scheduled idle callback and the time of the last press.
//! A zero timeout disables idle clearing.

use std::time::{Duration, Instant};

use crate::timer::{Timer, TimerCallback, TimerId};

#[derive(Debug)]
pub struct IdleTimer {
    timeout: Duration,
    pending: Option<TimerId>,
    last_press: Option<Instant>,
}

impl IdleTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: None,
            last_press: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.timeout.is_zero()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a press and reschedule. The previous callback is always
    /// cancelled first.
    pub fn restart(&mut self, timer: &dyn Timer, callback: TimerCallback) {
        self.cancel(timer);
        self.last_press = Some(timer.now());

        if self.is_enabled() {
            self.pending = Some(timer.schedule(self.timeout, callback));
        }
    }

    pub fn cancel(&mut self, timer: &dyn Timer) {
        if let Some(id) = self.pending.take() {
            timer.cancel(id);
        }
    }

    /// Forget the pending callback once it has fired.
    pub fn expire(&mut self) {
        self.pending = None;
    }

    /// Whether the idle timeout has elapsed since the last press.
    pub fn is_stale(&self, now: Instant) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.last_press
            .map(|at| now.saturating_duration_since(at) >= self.timeout)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;

    #[test]
    fn test_restart_keeps_single_pending_callback() {
        let timer = ManualTimer::new();
        let mut idle = IdleTimer::new(Duration::from_millis(750));

        idle.restart(&timer, Box::new(|| {}));
        idle.restart(&timer, Box::new(|| {}));
        idle.restart(&timer, Box::new(|| {}));

        assert!(idle.is_pending());
        assert_eq!(timer.pending_count(), 1, "Rescheduling must cancel the previous callback");
    }

    #[test]
    fn test_zero_timeout_never_schedules() {
        let timer = ManualTimer::new();
        let mut idle = IdleTimer::new(Duration::ZERO);

        idle.restart(&timer, Box::new(|| {}));

        assert!(!idle.is_enabled());
        assert!(!idle.is_pending());
        assert_eq!(timer.pending_count(), 0);
        assert!(!idle.is_stale(timer.now()));
    }

    #[test]
    fn test_cancel_removes_scheduled_callback() {
        let timer = ManualTimer::new();
        let mut idle = IdleTimer::new(Duration::from_millis(100));

        idle.restart(&timer, Box::new(|| {}));
        idle.cancel(&timer);

        assert!(!idle.is_pending());
        assert_eq!(timer.pending_count(), 0);
    }

    #[test]
    fn test_staleness() {
        let timer = ManualTimer::new();
        let mut idle = IdleTimer::new(Duration::from_millis(100));
        assert!(!idle.is_stale(timer.now()), "No press recorded yet");

        idle.restart(&timer, Box::new(|| {}));
        idle.cancel(&timer);

        timer.advance(Duration::from_millis(99));
        assert!(!idle.is_stale(timer.now()));

        timer.advance(Duration::from_millis(1));
        assert!(idle.is_stale(timer.now()));
    }
}
