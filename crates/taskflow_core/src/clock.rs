//! Time source for store timestamps.
//!
//! Stores never call `Utc::now()` directly so tests can drive timestamps with
//! a deterministic, strictly advancing clock.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock shared by every store of one application context.
pub type SharedClock = Rc<dyn Clock>;

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that returns `start`, then advances by `step` on every read.
#[derive(Debug)]
pub struct StepClock {
    next: Cell<DateTime<Utc>>,
    step: Duration,
}

impl StepClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }

    /// One-millisecond steps, matching the resolution of persisted timestamps.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self::new(start, Duration::milliseconds(1))
    }

    /// Returns the value the next `now()` call will produce.
    pub fn peek(&self) -> DateTime<Utc> {
        self.next.get()
    }

    pub fn advance(&self, by: Duration) {
        self.next.set(self.next.get() + by);
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let current = self.next.get();
        self.next.set(current + self.step);
        current
    }
}

pub fn system_clock() -> SharedClock {
    Rc::new(SystemClock)
}
