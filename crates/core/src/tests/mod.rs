//! Deterministic fixtures for exercising the session engine without a
//! browser: a manual timeline standing in for both clock and scheduler, and
//! recording fakes for the page capabilities.

mod fakes;

pub use fakes::{RecordingNavigator, RecordingSurface, ScriptedDecisions};
pub use timeline::ManualTimeline;

use crate::config::RemoteConfig;
use crate::store::CredentialPair;

/// Remote configuration pointing the identity provider at `endpoint`
///
/// # Panics
///
/// Panics if `endpoint` is not a valid URL.
#[must_use]
pub fn sample_config(endpoint: &str) -> RemoteConfig {
    serde_json::from_value(serde_json::json!({
        "cognito": {
            "region": "us-east-1",
            "clientId": "test-client",
            "userPoolId": "us-east-1_test",
            "endpoint": endpoint,
        },
        "api": { "baseUrl": endpoint.trim_end_matches('/') },
    }))
    .expect("sample config is valid")
}

/// A complete stored credential set
#[must_use]
pub fn sample_credentials() -> CredentialPair {
    CredentialPair {
        access_token: "access-0".to_string(),
        id_token: "id-0".to_string(),
        refresh_token: "refresh-0".to_string(),
        user_email: "ada@example.com".to_string(),
    }
}
