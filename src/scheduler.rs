//! Fixed-interval tick source.
//!
//! The session never sleeps: it asks an [`IntervalTimer`] how many ticks are
//! due against a [`Clock`] reading, so tests drive time by hand.

use std::time::{Duration, Instant};

pub(crate) const DEFAULT_TICK: Duration = Duration::from_millis(1000);

/// Monotonic time since some fixed origin.
pub(crate) trait Clock {
    fn now(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

pub(crate) struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual clock for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct ManualClock {
    now: std::cell::Cell<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

#[derive(Clone, Debug)]
pub(crate) struct IntervalTimer {
    interval: Duration,
    next_due: Option<Duration>,
}

impl IntervalTimer {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Arms the timer. The first fire is due immediately, then one per interval.
    pub(crate) fn start(&mut self, now: Duration) {
        self.next_due = Some(now);
    }

    pub(crate) fn cancel(&mut self) {
        self.next_due = None;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Consumes one elapsed interval if there is one. Call in a loop to catch up.
    pub(crate) fn fire_due(&mut self, now: Duration) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(due + self.interval);
                true
            }
            _ => false,
        }
    }
}
