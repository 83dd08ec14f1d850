//! DOM event wiring: user activity and changes made by other tabs

use bankscope_core::{
    ActivityKind, ActivityMonitor, ExpiryReason, SessionLifecycleManager, StorageKeys,
};
use gloo::events::EventListener;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::StorageEvent;

/// One passive document listener per activity kind
pub fn activity(monitor: &Rc<ActivityMonitor>) -> Vec<EventListener> {
    let document = gloo::utils::document();
    ActivityKind::ALL
        .into_iter()
        .map(|kind| {
            let monitor = monitor.clone();
            EventListener::new(&document, kind.event_name(), move |_| {
                monitor.notify_activity(kind);
            })
        })
        .collect()
}

/// What a `storage` event from another tab means for this one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossTabChange {
    /// The shared session was ended elsewhere
    SignedOut,
    /// The tokens were refreshed elsewhere
    Refreshed,
    /// The user was active in another tab
    Active,
    Unrelated,
}

impl CrossTabChange {
    /// Classify a change by storage key and new value; a `None` key means
    /// the whole store was cleared
    #[must_use]
    pub fn classify(key: Option<&str>, new_value: Option<&str>) -> Self {
        match (key, new_value) {
            (None, _) | (Some(StorageKeys::REFRESH_TOKEN), None) => Self::SignedOut,
            (Some(StorageKeys::ACCESS_TOKEN), Some(_)) => Self::Refreshed,
            (Some(StorageKeys::LAST_ACTIVITY), Some(_)) => Self::Active,
            _ => Self::Unrelated,
        }
    }
}

/// Follow sign-outs, refreshes and activity in other tabs of the same origin
pub fn cross_tab(manager: &Rc<SessionLifecycleManager>) -> EventListener {
    let manager = manager.clone();
    EventListener::new(&gloo::utils::window(), "storage", move |event| {
        let Some(event) = event.dyn_ref::<StorageEvent>() else {
            return;
        };
        let key = event.key();
        let new_value = event.new_value();
        match CrossTabChange::classify(key.as_deref(), new_value.as_deref()) {
            CrossTabChange::SignedOut => {
                manager.expire_session(ExpiryReason::OtherTab);
            }
            CrossTabChange::Refreshed => manager.reset_timers(),
            CrossTabChange::Active => {
                manager.sync_shared_activity();
            }
            CrossTabChange::Unrelated => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_refresh_token_signs_out() {
        assert_eq!(
            CrossTabChange::classify(Some("refreshToken"), None),
            CrossTabChange::SignedOut
        );
        assert_eq!(CrossTabChange::classify(None, None), CrossTabChange::SignedOut);
    }

    #[test]
    fn new_access_token_counts_as_refresh() {
        assert_eq!(
            CrossTabChange::classify(Some("accessToken"), Some("access-1")),
            CrossTabChange::Refreshed
        );
        assert_eq!(
            CrossTabChange::classify(Some("accessToken"), None),
            CrossTabChange::Unrelated
        );
        assert_eq!(
            CrossTabChange::classify(Some("theme"), Some("dark")),
            CrossTabChange::Unrelated
        );
    }

    #[test]
    fn shared_activity_time_counts_as_activity() {
        assert_eq!(
            CrossTabChange::classify(Some("lastActivityAt"), Some("2026-10-18T09:30:00.000Z")),
            CrossTabChange::Active
        );
        // removed together with the rest of the session on sign-out
        assert_eq!(
            CrossTabChange::classify(Some("lastActivityAt"), None),
            CrossTabChange::Unrelated
        );
    }
}
