//! Bankscope session engine
//!
//! Keeps a signed-in browser session alive while the user is active, warns
//! before inactivity expiry, refreshes tokens on request, and fails closed:
//! any refresh failure ends the session and clears stored credentials.
//!
//! The browser is reached only through the traits in [`store`],
//! [`scheduler`], [`interaction`], [`indicator`], [`clock`] and [`config`],
//! so everything here runs and tests off the browser as well.

pub mod activity;
pub mod api;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod indicator;
pub mod interaction;
pub mod lifecycle;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod store;

#[cfg(any(test, feature = "tests"))]
pub mod tests;

pub use activity::{ActivityKind, ActivityMonitor};
pub use api::{ApiClient, ApiPaths};
pub use clock::{Clock, SystemClock};
pub use config::{
    ApiConfig, ConfigSource, HttpConfigSource, IdentityProviderConfig, RemoteConfig,
    RemoteConfigProvider, StaticConfigSource,
};
pub use context::SessionContext;
pub use error::{ClientError, Result, SessionError};
pub use identity::{SignInClient, TokenRefreshClient};
pub use indicator::{SessionStatusIndicator, StatusDisplay, StatusSurface, Urgency};
pub use interaction::{Decision, DecisionProvider, Navigator};
pub use lifecycle::SessionLifecycleManager;
pub use scheduler::{Scheduler, TimerHandle, TimerTask};
pub use session::{ExpiryReason, Session, SessionState};
pub use settings::SessionSettings;
pub use store::{
    CredentialPair, CredentialStore, CredentialStoreExt, MemoryCredentialStore, StorageKeys,
};
