//! Session record and state

use crate::scheduler::TimerHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the signed-in session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Timers are running and activity keeps the session alive
    Active,
    /// The "stay signed in?" prompt is open or its refresh is in flight
    WarningIssued,
    /// Terminal for this session instance; only a new sign-in leaves it
    Expired,
}

impl SessionState {
    /// Whether the session may still be used
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Active | Self::WarningIssued)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::WarningIssued => "WARNING_ISSUED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
    /// The expiry timer fired
    Timeout,
    /// The user declined or ignored the warning prompt
    Declined,
    /// The refresh exchange failed
    RefreshFailed,
    /// The user signed out
    Logout,
    /// The backend rejected the stored credentials
    Revoked,
    /// Another tab ended the shared session
    OtherTab,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Timeout => "timeout",
            Self::Declined => "declined",
            Self::RefreshFailed => "refresh_failed",
            Self::Logout => "logout",
            Self::Revoked => "revoked",
            Self::OtherTab => "other_tab",
        };
        f.write_str(reason)
    }
}

/// A scheduled (warning, expiry) timer pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerPair {
    pub warning: TimerHandle,
    pub warning_at: DateTime<Utc>,
    pub expiry: TimerHandle,
    pub expires_at: DateTime<Utc>,
}

/// The page-wide session.
///
/// At most one timer pair is pending at any time. `generation` increases on
/// every reset and on expiry; a timer callback carrying an older generation
/// belongs to a superseded pair and is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub generation: u64,
    pub timers: Option<TimerPair>,
}

impl Session {
    /// Deadline of the pending expiry timer
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.timers.map(|pair| pair.expires_at)
    }

    /// Deadline of the pending warning timer
    #[must_use]
    pub fn warning_at(&self) -> Option<DateTime<Utc>> {
        self.timers.map(|pair| pair.warning_at)
    }
}

impl Default for Session {
    /// No live session until a sign-in or a resumed credential set starts one
    fn default() -> Self {
        Self {
            state: SessionState::Expired,
            last_activity_at: None,
            generation: 0,
            timers: None,
        }
    }
}
