//! Remaining-session-time indicator
//!
//! Read-only: recomputes the time left from the session record once per
//! interval and hands the result to an optional display surface.

use crate::clock::{deadline_after, elapsed_between};
use crate::context::SessionContext;
use crate::scheduler::{Scheduler, TimerHandle, TimerTask};
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// How loudly the indicator should present itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Notice,
    Urgent,
}

impl Urgency {
    /// CSS class used by the page
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Notice => "session-timer-notice",
            Self::Urgent => "session-timer-urgent",
        }
    }
}

/// One rendered frame of the indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDisplay {
    pub remaining: Duration,
    pub urgency: Urgency,
}

impl StatusDisplay {
    /// Whole minutes left, rounded up
    #[must_use]
    pub const fn minutes(&self) -> u64 {
        self.remaining.as_secs().div_ceil(60)
    }

    #[must_use]
    pub fn text(&self) -> String {
        format!("Session expires in {} min", self.minutes())
    }
}

/// Where the indicator draws itself
pub trait StatusSurface {
    /// Show `display`, or hide the indicator when it is `None`
    fn render(&self, display: Option<&StatusDisplay>);
}

pub struct SessionStatusIndicator {
    ctx: Rc<SessionContext>,
    scheduler: Rc<dyn Scheduler>,
    surface: Option<Rc<dyn StatusSurface>>,
    next_tick: Cell<Option<TimerHandle>>,
    this: Weak<Self>,
}

impl SessionStatusIndicator {
    /// Create an indicator; a missing surface turns rendering into a no-op
    pub fn new(
        ctx: Rc<SessionContext>,
        scheduler: Rc<dyn Scheduler>,
        surface: Option<Rc<dyn StatusSurface>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            ctx,
            scheduler,
            surface,
            next_tick: Cell::new(None),
            this: this.clone(),
        })
    }

    /// Time left at `now`, `None` without a live session
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let session = self.ctx.session();
        if !session.state.is_live() {
            return None;
        }
        let last_activity = session.last_activity_at?;
        let expires_at = deadline_after(last_activity, self.ctx.settings().session_timeout);
        Some(elapsed_between(now, expires_at))
    }

    /// What to show at `now`, `None` while the indicator should stay hidden
    pub fn display(&self, now: DateTime<Utc>) -> Option<StatusDisplay> {
        let settings = self.ctx.settings();
        let remaining = self.remaining(now)?;
        if remaining > settings.indicator_visible_below {
            return None;
        }
        let urgency = if remaining < settings.indicator_urgent_below {
            Urgency::Urgent
        } else {
            Urgency::Notice
        };
        Some(StatusDisplay { remaining, urgency })
    }

    /// Recompute and render once
    pub fn tick(&self) {
        let display = self.display(self.ctx.clock().now());
        if let Some(surface) = &self.surface {
            surface.render(display.as_ref());
        }
    }

    /// Render now and then once per interval until [`stop`](Self::stop)
    pub fn start(&self) {
        self.stop();
        self.tick();
        self.schedule_next();
    }

    pub fn stop(&self) {
        if let Some(handle) = self.next_tick.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn schedule_next(&self) {
        let interval = self.ctx.settings().indicator_interval;
        let handle = self.scheduler.schedule(interval, self.tick_task());
        self.next_tick.set(Some(handle));
    }

    fn tick_task(&self) -> TimerTask {
        let this = self.this.clone();
        Box::pin(async move {
            if let Some(indicator) = this.upgrade() {
                indicator.tick();
                indicator.schedule_next();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfigProvider;
    use crate::identity::TokenRefreshClient;
    use crate::lifecycle::SessionLifecycleManager;
    use crate::settings::SessionSettings;
    use crate::store::MemoryCredentialStore;
    use crate::tests::{
        ManualTimeline, RecordingNavigator, RecordingSurface, ScriptedDecisions, sample_config,
        sample_credentials,
    };

    fn started() -> (Rc<ManualTimeline>, Rc<SessionContext>, Rc<SessionLifecycleManager>) {
        let timeline = Rc::new(ManualTimeline::new());
        let ctx = SessionContext::with_clock(
            SessionSettings::default(),
            Rc::new(MemoryCredentialStore::new()),
            Rc::new(RemoteConfigProvider::preloaded(sample_config(
                "http://127.0.0.1:9/",
            ))),
            timeline.clone(),
        );
        let manager = SessionLifecycleManager::new(
            ctx.clone(),
            timeline.clone(),
            Rc::new(ScriptedDecisions::default()),
            Rc::new(RecordingNavigator::default()),
            TokenRefreshClient::new(ctx.clone()),
        );
        manager.begin(&sample_credentials()).unwrap();
        (timeline, ctx, manager)
    }

    #[test]
    fn hidden_above_ten_minutes() {
        let (timeline, ctx, _manager) = started();
        let indicator = SessionStatusIndicator::new(ctx, timeline.clone(), None);

        let now = timeline.at(Duration::from_secs(49 * 60));
        assert_eq!(indicator.remaining(now), Some(Duration::from_secs(11 * 60)));
        assert_eq!(indicator.display(now), None);
    }

    #[test]
    fn notice_then_urgent() {
        let (timeline, ctx, _manager) = started();
        let indicator = SessionStatusIndicator::new(ctx, timeline.clone(), None);

        let notice = indicator
            .display(timeline.at(Duration::from_secs(52 * 60)))
            .unwrap();
        assert_eq!(notice.urgency, Urgency::Notice);
        assert_eq!(notice.text(), "Session expires in 8 min");

        let urgent = indicator
            .display(timeline.at(Duration::from_secs(56 * 60 + 30)))
            .unwrap();
        assert_eq!(urgent.urgency, Urgency::Urgent);
        assert_eq!(urgent.minutes(), 4);
    }

    #[test]
    fn nothing_to_show_after_logout() {
        let (timeline, ctx, manager) = started();
        let indicator = SessionStatusIndicator::new(ctx, timeline.clone(), None);
        manager.logout();
        assert_eq!(indicator.remaining(timeline.at(Duration::from_secs(3500))), None);
    }

    #[test]
    fn missing_surface_is_a_no_op() {
        let (timeline, ctx, manager) = started();
        let indicator = SessionStatusIndicator::new(ctx, timeline, None);
        indicator.tick();
        assert_eq!(manager.pending_timer_pairs(), 1);
    }

    #[tokio::test]
    async fn ticks_once_per_interval_without_touching_the_session() {
        let (timeline, ctx, manager) = started();
        let surface = Rc::new(RecordingSurface::default());
        let indicator = SessionStatusIndicator::new(ctx, timeline.clone(), Some(surface.clone()));
        let expires_at = manager.expires_at();

        indicator.start();
        timeline.advance(Duration::from_secs(51 * 60)).await;

        let frames = surface.frames();
        assert_eq!(frames.len(), 52);
        assert!(frames[..50].iter().all(Option::is_none));
        assert!(frames[50].is_some());
        assert_eq!(
            surface.last().map(|d| d.urgency),
            Some(Urgency::Notice)
        );
        assert_eq!(manager.expires_at(), expires_at);

        indicator.stop();
        timeline.advance(Duration::from_secs(120)).await;
        assert_eq!(surface.frames().len(), 52);
    }
}
