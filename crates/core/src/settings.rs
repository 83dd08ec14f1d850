//! Client-side session settings
//!
//! Timing constants for the inactivity timers, the status indicator and the
//! activity throttle, plus the page paths the client talks to. Every field has
//! a default, so an empty JSON object is a valid settings document.

use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSettings {
    /// Inactivity period after which the session expires
    #[serde(with = "seconds")]
    pub session_timeout: Duration,
    /// How long before expiry the "stay signed in?" prompt appears
    #[serde(with = "seconds")]
    pub warning_window: Duration,
    /// Minimum spacing between activity-driven timer resets
    #[serde(with = "seconds")]
    pub activity_throttle: Duration,
    /// Status indicator refresh interval
    #[serde(with = "seconds")]
    pub indicator_interval: Duration,
    /// The indicator stays hidden while more than this remains
    #[serde(with = "seconds")]
    pub indicator_visible_below: Duration,
    /// Below this the indicator switches to its urgent style
    #[serde(with = "seconds")]
    pub indicator_urgent_below: Duration,
    /// Path of the remote configuration endpoint, relative to the page origin
    pub config_path: String,
    /// Unauthenticated entry page
    pub login_path: String,
    /// Log level filter (e.g., "info", "debug", "trace")
    pub log_level: String,
}

impl SessionSettings {
    pub const SESSION_TIMEOUT: Duration = Duration::from_secs(60 * 60);
    pub const WARNING_WINDOW: Duration = Duration::from_secs(5 * 60);
    pub const ACTIVITY_THROTTLE: Duration = Duration::from_secs(60);
    pub const INDICATOR_INTERVAL: Duration = Duration::from_secs(60);
    pub const INDICATOR_VISIBLE_BELOW: Duration = Duration::from_secs(10 * 60);
    pub const INDICATOR_URGENT_BELOW: Duration = Duration::from_secs(5 * 60);

    /// Parse settings from a JSON document, filling in defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::config_unavailable(format!("invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Delay from the last reset until the warning prompt
    #[must_use]
    pub const fn warning_delay(&self) -> Duration {
        self.session_timeout.saturating_sub(self.warning_window)
    }

    /// Check the timing relationships the lifecycle relies on
    pub fn validate(&self) -> Result<()> {
        if self.session_timeout.is_zero() {
            return Err(SessionError::config_unavailable(
                "sessionTimeout must be positive",
            ));
        }
        if self.warning_window >= self.session_timeout {
            return Err(SessionError::config_unavailable(
                "warningWindow must be shorter than sessionTimeout",
            ));
        }
        if self.indicator_interval.is_zero() {
            return Err(SessionError::config_unavailable(
                "indicatorInterval must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_timeout: Self::SESSION_TIMEOUT,
            warning_window: Self::WARNING_WINDOW,
            activity_throttle: Self::ACTIVITY_THROTTLE,
            indicator_interval: Self::INDICATOR_INTERVAL,
            indicator_visible_below: Self::INDICATOR_VISIBLE_BELOW,
            indicator_urgent_below: Self::INDICATOR_URGENT_BELOW,
            config_path: "/api/config".to_string(),
            login_path: "login.html".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Durations travel as whole seconds
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_constants() {
        let settings = SessionSettings::default();
        assert_eq!(settings.session_timeout, Duration::from_secs(3600));
        assert_eq!(settings.warning_window, Duration::from_secs(300));
        assert_eq!(settings.warning_delay(), Duration::from_secs(3300));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let settings = SessionSettings::from_json("{}").unwrap();
        assert_eq!(settings, SessionSettings::default());
    }

    #[test]
    fn partial_document_overrides_in_seconds() {
        let settings =
            SessionSettings::from_json(r#"{"sessionTimeout": 900, "warningWindow": 60}"#).unwrap();
        assert_eq!(settings.session_timeout, Duration::from_secs(900));
        assert_eq!(settings.warning_delay(), Duration::from_secs(840));
        assert_eq!(settings.login_path, "login.html");
    }

    #[test]
    fn warning_window_must_fit_inside_timeout() {
        let err = SessionSettings::from_json(r#"{"sessionTimeout": 300, "warningWindow": 300}"#)
            .unwrap_err();
        assert!(matches!(err, SessionError::ConfigUnavailable(_)));
    }
}
