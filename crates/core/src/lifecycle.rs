//! Session lifecycle: the warn-then-expire state machine
//!
//! ```text
//!   begin/resume ──► ACTIVE ──reset_timers──► ACTIVE
//!                      │
//!                warning fires
//!                      ▼
//!               WARNING_ISSUED ──accept + refresh ok──► ACTIVE
//!                      │
//!      decline / no answer / refresh fails / expiry fires / logout
//!                      ▼
//!                   EXPIRED
//! ```

use crate::clock::{deadline_after, elapsed_between};
use crate::context::SessionContext;
use crate::error::{Result, SessionError};
use crate::identity::TokenRefreshClient;
use crate::interaction::{Decision, DecisionProvider, Navigator};
use crate::scheduler::{Scheduler, TimerTask};
use crate::session::{ExpiryReason, SessionState, TimerPair};
use crate::store::{CredentialPair, CredentialStoreExt};
use chrono::{DateTime, Utc};
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns the warning/expiry timer pair and every state transition
pub struct SessionLifecycleManager {
    ctx: Rc<SessionContext>,
    scheduler: Rc<dyn Scheduler>,
    decisions: Rc<dyn DecisionProvider>,
    navigator: Rc<dyn Navigator>,
    refresher: TokenRefreshClient,
    this: Weak<Self>,
}

impl SessionLifecycleManager {
    pub fn new(
        ctx: Rc<SessionContext>,
        scheduler: Rc<dyn Scheduler>,
        decisions: Rc<dyn DecisionProvider>,
        navigator: Rc<dyn Navigator>,
        refresher: TokenRefreshClient,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            ctx,
            scheduler,
            decisions,
            navigator,
            refresher,
            this: this.clone(),
        })
    }

    pub fn context(&self) -> &Rc<SessionContext> {
        &self.ctx
    }

    /// Start a new session from a successful sign-in
    pub fn begin(&self, credentials: &CredentialPair) -> Result<()> {
        self.ctx.store().save_credentials(credentials)?;
        info!(user = %credentials.user_email, "session started");
        self.activate();
        Ok(())
    }

    /// Continue the session stored by an earlier page, if there is one
    pub fn resume(&self) -> bool {
        match self.ctx.store().credentials() {
            Some(credentials) => {
                info!(user = %credentials.user_email, "session resumed");
                self.activate();
                true
            }
            None => {
                debug!("no stored credentials; staying signed out");
                false
            }
        }
    }

    fn activate(&self) {
        self.ctx.session_mut().state = SessionState::Active;
        self.arm();
    }

    /// Restart the inactivity timers from now. Ignored unless `ACTIVE`.
    pub fn reset_timers(&self) {
        let state = self.ctx.session().state;
        if state != SessionState::Active {
            debug!(%state, "timer reset ignored");
            return;
        }
        self.arm();
    }

    /// Cancel the pending pair, then schedule a new one from now. The time
    /// is shared with other tabs through the store.
    fn arm(&self) {
        let now = self.ctx.clock().now();
        if let Err(e) = self.ctx.store().record_activity(now) {
            warn!(error = %e, "failed to share activity time");
        }
        self.arm_from(now);
    }

    /// Cancel the pending pair, then schedule a new one counted from `at`
    fn arm_from(&self, at: DateTime<Utc>) {
        let settings = self.ctx.settings();
        let now = self.ctx.clock().now();

        let (previous, generation) = {
            let mut session = self.ctx.session_mut();
            session.generation += 1;
            session.last_activity_at = Some(at);
            (session.timers.take(), session.generation)
        };
        if let Some(previous) = previous {
            self.scheduler.cancel(previous.warning);
            self.scheduler.cancel(previous.expiry);
        }

        let warning_at = deadline_after(at, settings.warning_delay());
        let expires_at = deadline_after(at, settings.session_timeout);
        let warning = self
            .scheduler
            .schedule(elapsed_between(now, warning_at), self.warning_task(generation));
        let expiry = self
            .scheduler
            .schedule(elapsed_between(now, expires_at), self.expiry_task(generation));

        let pair = TimerPair {
            warning,
            warning_at,
            expiry,
            expires_at,
        };
        self.ctx.session_mut().timers = Some(pair);
        debug!(generation, %expires_at, "session timers armed");
    }

    /// Adopt a later activity time recorded by another tab sharing the
    /// store, so an idle tab never ends a session a busy tab is using.
    /// Returns `true` when the timers were re-armed from it.
    pub fn sync_shared_activity(&self) -> bool {
        let Some(shared) = self.ctx.store().last_activity() else {
            return false;
        };
        let newer = {
            let session = self.ctx.session();
            session.state.is_live() && session.last_activity_at.is_none_or(|local| shared > local)
        };
        if !newer {
            return false;
        }
        debug!(%shared, "adopting activity from another tab");
        self.ctx.session_mut().state = SessionState::Active;
        self.arm_from(shared);
        true
    }

    fn warning_task(&self, generation: u64) -> TimerTask {
        let this = self.this.clone();
        Box::pin(async move {
            if let Some(manager) = this.upgrade() {
                manager.on_warning(generation).await;
            }
        })
    }

    fn expiry_task(&self, generation: u64) -> TimerTask {
        let this = self.this.clone();
        Box::pin(async move {
            if let Some(manager) = this.upgrade() {
                manager.on_expiry(generation);
            }
        })
    }

    fn check_generation(&self, scheduled: u64) -> Result<()> {
        let current = self.ctx.session().generation;
        if scheduled == current {
            Ok(())
        } else {
            Err(SessionError::TimerRaceStale { scheduled, current })
        }
    }

    async fn on_warning(&self, generation: u64) {
        if let Err(e) = self.check_generation(generation) {
            debug!(error = %e, "warning callback ignored");
            return;
        }
        if self.sync_shared_activity() {
            return;
        }
        self.ctx.session_mut().state = SessionState::WarningIssued;

        let remaining = self.remaining().unwrap_or_default();
        info!(remaining_secs = remaining.as_secs(), "session expiry warning issued");

        // blocks the page until answered
        match self.decisions.confirm_stay_signed_in(remaining) {
            Decision::Accept => self.extend(generation).await,
            decision => {
                info!(?decision, "user did not extend the session");
                self.expire_session(ExpiryReason::Declined);
            }
        }
    }

    async fn extend(&self, generation: u64) {
        let outcome = self.refresher.refresh().await;

        // the session may have moved on while the exchange was in flight
        let still_waiting = {
            let session = self.ctx.session();
            session.generation == generation && session.state == SessionState::WarningIssued
        };

        if !still_waiting {
            debug!(ok = outcome.is_ok(), "refresh finished for a superseded session; result dropped");
            return;
        }
        match outcome {
            Ok(()) => {
                info!("session extended");
                self.activate();
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed");
                self.expire_session(ExpiryReason::RefreshFailed);
            }
        }
    }

    fn on_expiry(&self, generation: u64) {
        if let Err(e) = self.check_generation(generation) {
            debug!(error = %e, "expiry callback ignored");
            return;
        }
        if self.sync_shared_activity() {
            return;
        }
        self.expire_session(ExpiryReason::Timeout);
    }

    /// End the session: cancel timers, clear the store, leave for the sign-in
    /// page. Returns `false` when the session had already ended.
    pub fn expire_session(&self, reason: ExpiryReason) -> bool {
        let timers = {
            let mut session = self.ctx.session_mut();
            if session.state == SessionState::Expired {
                debug!(%reason, "session already expired");
                return false;
            }
            session.state = SessionState::Expired;
            session.generation += 1;
            session.timers.take()
        };
        if let Some(timers) = timers {
            self.scheduler.cancel(timers.warning);
            self.scheduler.cancel(timers.expiry);
        }

        if let Err(e) = self.ctx.store().clear() {
            warn!(error = %e, "failed to clear stored credentials");
        }

        info!(%reason, "session expired");
        self.navigator.redirect_to_login();
        true
    }

    /// Explicit sign-out
    pub fn logout(&self) -> bool {
        self.expire_session(ExpiryReason::Logout)
    }

    pub fn state(&self) -> SessionState {
        self.ctx.session().state
    }

    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.ctx.session().last_activity_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.ctx.session().expires_at()
    }

    pub fn warning_at(&self) -> Option<DateTime<Utc>> {
        self.ctx.session().warning_at()
    }

    /// Number of pending (warning, expiry) pairs: 0 or 1
    pub fn pending_timer_pairs(&self) -> usize {
        usize::from(self.ctx.session().timers.is_some())
    }

    /// Time left before the pending expiry fires
    pub fn remaining(&self) -> Option<Duration> {
        let expires_at = self.expires_at()?;
        Some(elapsed_between(self.ctx.clock().now(), expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfigProvider;
    use crate::interaction::{MockDecisionProvider, MockNavigator};
    use crate::settings::SessionSettings;
    use crate::store::{CredentialStore, MemoryCredentialStore, StorageKeys};
    use crate::tests::{
        ManualTimeline, RecordingNavigator, ScriptedDecisions, sample_config, sample_credentials,
    };

    struct Fixture {
        timeline: Rc<ManualTimeline>,
        store: Rc<MemoryCredentialStore>,
        manager: Rc<SessionLifecycleManager>,
    }

    fn fixture(decisions: Rc<dyn DecisionProvider>, navigator: Rc<dyn Navigator>) -> Fixture {
        let timeline = Rc::new(ManualTimeline::new());
        let store = Rc::new(MemoryCredentialStore::new());
        let config = Rc::new(RemoteConfigProvider::preloaded(sample_config(
            "http://127.0.0.1:9/",
        )));
        let ctx = SessionContext::with_clock(
            SessionSettings::default(),
            store.clone(),
            config,
            timeline.clone(),
        );
        let refresher = TokenRefreshClient::new(ctx.clone());
        let manager =
            SessionLifecycleManager::new(ctx, timeline.clone(), decisions, navigator, refresher);
        Fixture {
            timeline,
            store,
            manager,
        }
    }

    #[test]
    fn begin_arms_one_pair() {
        let f = fixture(
            Rc::new(ScriptedDecisions::default()),
            Rc::new(RecordingNavigator::default()),
        );
        f.manager.begin(&sample_credentials()).unwrap();

        assert_eq!(f.manager.state(), SessionState::Active);
        assert_eq!(f.manager.pending_timer_pairs(), 1);
        assert_eq!(f.timeline.pending(), 2);
        assert_eq!(
            f.manager.expires_at(),
            Some(f.timeline.at(Duration::from_secs(3600)))
        );
        assert_eq!(
            f.manager.warning_at(),
            Some(f.timeline.at(Duration::from_secs(3300)))
        );
        assert!(f.store.credentials().is_some());
    }

    #[test]
    fn resume_without_credentials_stays_signed_out() {
        let f = fixture(
            Rc::new(ScriptedDecisions::default()),
            Rc::new(RecordingNavigator::default()),
        );
        assert!(!f.manager.resume());
        assert_eq!(f.manager.state(), SessionState::Expired);
        assert_eq!(f.timeline.pending(), 0);
    }

    #[test]
    fn reset_replaces_the_pending_pair() {
        let f = fixture(
            Rc::new(ScriptedDecisions::default()),
            Rc::new(RecordingNavigator::default()),
        );
        f.manager.begin(&sample_credentials()).unwrap();
        let first = f.manager.expires_at();

        f.timeline.set_elapsed(Duration::from_secs(120));
        f.manager.reset_timers();

        assert_eq!(f.timeline.pending(), 2);
        assert_ne!(f.manager.expires_at(), first);
        assert_eq!(
            f.manager.expires_at(),
            Some(f.timeline.at(Duration::from_secs(3720)))
        );
    }

    #[test]
    fn reset_on_expired_session_is_ignored() {
        let f = fixture(
            Rc::new(ScriptedDecisions::default()),
            Rc::new(RecordingNavigator::default()),
        );
        f.manager.reset_timers();
        assert_eq!(f.timeline.pending(), 0);
        assert_eq!(f.manager.state(), SessionState::Expired);
    }

    #[test]
    fn expire_twice_navigates_once() {
        let mut navigator = MockNavigator::new();
        navigator.expect_redirect_to_login().times(1).return_const(());
        let f = fixture(Rc::new(ScriptedDecisions::default()), Rc::new(navigator));
        f.manager.begin(&sample_credentials()).unwrap();

        assert!(f.manager.expire_session(ExpiryReason::Timeout));
        assert!(!f.manager.expire_session(ExpiryReason::Timeout));
        assert!(!f.manager.logout());

        assert_eq!(f.manager.state(), SessionState::Expired);
        assert_eq!(f.timeline.pending(), 0);
        assert!(f.store.is_empty());
    }

    #[test]
    fn stale_expiry_callback_is_ignored() {
        let navigator = Rc::new(RecordingNavigator::default());
        let f = fixture(Rc::new(ScriptedDecisions::default()), navigator.clone());
        f.manager.begin(&sample_credentials()).unwrap();
        let stale = f.manager.context().session().generation;

        f.timeline.set_elapsed(Duration::from_secs(60));
        f.manager.reset_timers();

        f.manager.on_expiry(stale);
        assert_eq!(f.manager.state(), SessionState::Active);
        assert_eq!(navigator.redirects(), 0);
    }

    #[test]
    fn current_expiry_callback_ends_the_session() {
        let navigator = Rc::new(RecordingNavigator::default());
        let f = fixture(Rc::new(ScriptedDecisions::default()), navigator.clone());
        f.manager.begin(&sample_credentials()).unwrap();
        let current = f.manager.context().session().generation;

        f.manager.on_expiry(current);
        assert_eq!(f.manager.state(), SessionState::Expired);
        assert_eq!(navigator.redirects(), 1);
        assert!(f.store.is_empty());
        assert_eq!(f.timeline.pending(), 0);
    }

    #[tokio::test]
    async fn declined_warning_expires_without_refresh() {
        let mut decisions = MockDecisionProvider::new();
        decisions
            .expect_confirm_stay_signed_in()
            .times(1)
            .withf(|remaining| *remaining == Duration::from_secs(300))
            .return_const(Decision::Decline);
        let navigator = Rc::new(RecordingNavigator::default());
        let f = fixture(Rc::new(decisions), navigator.clone());
        f.manager.begin(&sample_credentials()).unwrap();

        f.timeline.advance(Duration::from_secs(3300)).await;

        assert_eq!(f.manager.state(), SessionState::Expired);
        assert_eq!(navigator.redirects(), 1);
        assert!(f.store.is_empty());
        assert_eq!(f.timeline.pending(), 0);
    }

    #[tokio::test]
    async fn unanswered_prompt_counts_as_decline() {
        let navigator = Rc::new(RecordingNavigator::default());
        let f = fixture(
            Rc::new(ScriptedDecisions::new([Decision::TimedOut])),
            navigator.clone(),
        );
        f.manager.begin(&sample_credentials()).unwrap();

        f.timeline.advance(Duration::from_secs(3300)).await;
        assert_eq!(f.manager.state(), SessionState::Expired);
        assert_eq!(navigator.redirects(), 1);
    }

    #[tokio::test]
    async fn accepted_warning_without_refresh_token_expires() {
        let navigator = Rc::new(RecordingNavigator::default());
        let f = fixture(
            Rc::new(ScriptedDecisions::new([Decision::Accept])),
            navigator.clone(),
        );
        f.manager.begin(&sample_credentials()).unwrap();
        f.store.remove(StorageKeys::REFRESH_TOKEN).unwrap();

        f.timeline.advance(Duration::from_secs(3300)).await;

        assert_eq!(f.manager.state(), SessionState::Expired);
        assert_eq!(navigator.redirects(), 1);
    }

    #[test]
    fn later_shared_activity_rearms_from_it() {
        let f = fixture(
            Rc::new(ScriptedDecisions::default()),
            Rc::new(RecordingNavigator::default()),
        );
        f.manager.begin(&sample_credentials()).unwrap();
        assert_eq!(f.store.last_activity(), Some(f.timeline.at(Duration::ZERO)));

        f.timeline.set_elapsed(Duration::from_secs(120));
        f.store
            .record_activity(f.timeline.at(Duration::from_secs(100)))
            .unwrap();

        assert!(f.manager.sync_shared_activity());
        assert_eq!(f.timeline.pending(), 2);
        assert_eq!(
            f.manager.expires_at(),
            Some(f.timeline.at(Duration::from_secs(3700)))
        );
        assert_eq!(
            f.timeline.deadlines(),
            vec![
                f.timeline.at(Duration::from_secs(3400)),
                f.timeline.at(Duration::from_secs(3700)),
            ]
        );
        // adopting the shared time does not write it back
        assert_eq!(
            f.store.last_activity(),
            Some(f.timeline.at(Duration::from_secs(100)))
        );

        // nothing newer to adopt the second time
        assert!(!f.manager.sync_shared_activity());
    }

    #[test]
    fn shared_activity_never_revives_an_ended_session() {
        let f = fixture(
            Rc::new(ScriptedDecisions::default()),
            Rc::new(RecordingNavigator::default()),
        );
        f.store
            .record_activity(f.timeline.at(Duration::from_secs(10)))
            .unwrap();

        assert!(!f.manager.sync_shared_activity());
        assert_eq!(f.manager.state(), SessionState::Expired);
        assert_eq!(f.timeline.pending(), 0);
    }

    #[tokio::test]
    async fn warning_fires_at_fifty_five_minutes() {
        let navigator = Rc::new(RecordingNavigator::default());
        let f = fixture(Rc::new(ScriptedDecisions::default()), navigator.clone());
        f.manager.begin(&sample_credentials()).unwrap();

        f.timeline.advance(Duration::from_secs(3299)).await;
        assert_eq!(f.manager.state(), SessionState::Active);
        assert_eq!(navigator.redirects(), 0);

        // default scripted answer is a decline, so the warning ends it
        f.timeline.advance(Duration::from_secs(1)).await;
        assert_eq!(f.manager.state(), SessionState::Expired);
        assert_eq!(navigator.redirects(), 1);
    }
}
