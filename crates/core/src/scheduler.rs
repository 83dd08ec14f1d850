//! Cancellable delayed tasks

use futures::future::LocalBoxFuture;
use std::fmt;
use std::time::Duration;

/// Work run when a timer fires.
///
/// Tasks are local futures: a timer callback may await a network exchange,
/// and nothing here ever leaves the page's event thread.
pub type TimerTask = LocalBoxFuture<'static, ()>;

/// Identifies one scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Runs tasks after a delay
pub trait Scheduler {
    /// Run `task` once `delay` has elapsed
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;

    /// Drop a task that has not fired yet; unknown or fired handles are ignored
    fn cancel(&self, handle: TimerHandle);
}
