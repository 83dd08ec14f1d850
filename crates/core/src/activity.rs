//! User activity tracking

use crate::clock::elapsed_between;
use crate::context::SessionContext;
use crate::lifecycle::SessionLifecycleManager;
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Interaction kinds that count as the user being present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    PointerPress,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

impl ActivityKind {
    pub const ALL: [Self; 5] = [
        Self::PointerPress,
        Self::KeyPress,
        Self::Scroll,
        Self::TouchStart,
        Self::Click,
    ];

    /// DOM event name
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::PointerPress => "mousedown",
            Self::KeyPress => "keypress",
            Self::Scroll => "scroll",
            Self::TouchStart => "touchstart",
            Self::Click => "click",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Turns raw interaction events into throttled timer resets.
///
/// Every event is timestamped; a reset is only requested once the throttle
/// interval has passed since the session's last recorded activity.
pub struct ActivityMonitor {
    ctx: Rc<SessionContext>,
    manager: Rc<SessionLifecycleManager>,
    last_event_at: Cell<Option<DateTime<Utc>>>,
}

impl ActivityMonitor {
    pub fn new(ctx: Rc<SessionContext>, manager: Rc<SessionLifecycleManager>) -> Self {
        Self {
            ctx,
            manager,
            last_event_at: Cell::new(None),
        }
    }

    /// Record one interaction. Returns whether it reset the session timers.
    pub fn notify_activity(&self, kind: ActivityKind) -> bool {
        let now = self.ctx.clock().now();
        self.last_event_at.set(Some(now));

        let throttle = self.ctx.settings().activity_throttle;
        let due = self
            .ctx
            .session()
            .last_activity_at
            .is_none_or(|at| elapsed_between(at, now) >= throttle);
        if !due {
            return false;
        }

        tracing::trace!(%kind, "activity resets session timers");
        self.manager.reset_timers();
        true
    }

    /// Timestamp of the most recent raw event
    pub fn last_event_at(&self) -> Option<DateTime<Utc>> {
        self.last_event_at.get()
    }
}
