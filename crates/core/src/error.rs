//! Error types shared by the session engine

use thiserror::Error;

/// Standard result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by the session engine.
///
/// None of these are fatal to the page: after any of them the client keeps
/// running, unauthenticated if need be.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The remote configuration could not be fetched or parsed
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// No credentials are present for an operation that needs them
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The identity provider declined the refresh or could not be reached
    #[error("Token refresh rejected")]
    RefreshRejected,

    /// The identity provider declined the sign-in or could not be reached
    #[error("Sign-in rejected")]
    SignInRejected,

    /// A timer fired for a superseded generation
    #[error("Stale timer callback: scheduled for generation {scheduled}, current is {current}")]
    TimerRaceStale { scheduled: u64, current: u64 },

    /// The persistent store refused an operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// The backend API answered with a non-success status or an unreadable body
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

impl SessionError {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a config-unavailable error
    pub fn config_unavailable(message: impl Into<String>) -> Self {
        Self::ConfigUnavailable(message.into())
    }

    /// Short message suitable for an inline status line
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigUnavailable(_) => {
                "Service configuration could not be loaded. Some features are unavailable."
                    .to_string()
            }
            Self::NotAuthenticated => "Please sign in to continue.".to_string(),
            Self::RefreshRejected => "Your session could not be extended. Please sign in again."
                .to_string(),
            Self::SignInRejected => "Sign-in failed. Check your email and password.".to_string(),
            Self::TimerRaceStale { .. } => String::new(),
            Self::Storage(_) => "Your browser refused to store session data.".to_string(),
            Self::Api { message, .. } => message.clone(),
        }
    }
}

/// Transport-level failures inside the HTTP collaborators.
///
/// These never leave a component as-is: each caller collapses them into the
/// single [`SessionError`] kind its contract promises.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response parsed but lacks required fields
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    /// Status code carried by the error, if the server answered at all
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
