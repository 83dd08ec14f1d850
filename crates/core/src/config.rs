//! Remote configuration: identity provider and API coordinates
//!
//! The page fetches this document once. Every network call that needs it waits
//! for that single load; when the load fails the client keeps running in a
//! degraded, unauthenticated mode instead of retrying.

use crate::error::{ClientError, Result, SessionError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tokio::sync::OnceCell;
use url::Url;

/// Configuration served by the config endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(rename = "cognito", alias = "identityProvider")]
    pub identity_provider: IdentityProviderConfig,
    pub api: ApiConfig,
}

/// Hosted identity provider coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderConfig {
    pub region: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool_id: Option<String>,
    /// Replaces the endpoint derived from `region`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Url>,
}

/// Backend API coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
}

impl IdentityProviderConfig {
    /// Token endpoint of the identity provider
    pub fn token_endpoint(&self) -> Result<Url> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        Url::parse(&format!("https://cognito-idp.{}.amazonaws.com/", self.region)).map_err(|e| {
            SessionError::config_unavailable(format!("invalid region {:?}: {e}", self.region))
        })
    }
}

impl ApiConfig {
    /// Absolute URL for an API path, keeping any stage prefix in the base.
    ///
    /// Deployments without a backend serve an empty `baseUrl`; that only
    /// fails here, so sign-in and refresh keep working.
    pub fn url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(SessionError::config_unavailable("api baseUrl is not configured"));
        }
        Url::parse(&format!("{base}/{}", path.trim_start_matches('/'))).map_err(|e| {
            SessionError::config_unavailable(format!("invalid api baseUrl {base:?}: {e}"))
        })
    }
}

impl RemoteConfig {
    /// Reject documents the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.identity_provider.client_id.is_empty() {
            return Err(SessionError::config_unavailable("clientId is empty"));
        }
        if self.identity_provider.region.is_empty() && self.identity_provider.endpoint.is_none() {
            return Err(SessionError::config_unavailable("region is empty"));
        }
        self.identity_provider.token_endpoint()?;
        Ok(())
    }
}

/// Somewhere the remote configuration can be fetched from
#[async_trait(?Send)]
pub trait ConfigSource {
    async fn fetch(&self) -> std::result::Result<RemoteConfig, ClientError>;
}

/// Fetches the configuration with a single `GET`
#[derive(Clone)]
pub struct HttpConfigSource {
    client: reqwest::Client,
    url: String,
}

impl HttpConfigSource {
    /// Create a source for the given absolute URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Use a custom HTTP client
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Get the URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait(?Send)]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self) -> std::result::Result<RemoteConfig, ClientError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ClientError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Already-known configuration, for pages that embed it
pub struct StaticConfigSource(pub RemoteConfig);

#[async_trait(?Send)]
impl ConfigSource for StaticConfigSource {
    async fn fetch(&self) -> std::result::Result<RemoteConfig, ClientError> {
        Ok(self.0.clone())
    }
}

/// Loads the remote configuration at most once per page.
///
/// Concurrent callers of [`load`](Self::load) share the one in-flight fetch.
/// A failed load is remembered, so later callers get
/// [`SessionError::ConfigUnavailable`] straight away.
pub struct RemoteConfigProvider {
    source: Box<dyn ConfigSource>,
    loaded: OnceCell<std::result::Result<Rc<RemoteConfig>, String>>,
}

impl RemoteConfigProvider {
    /// Create a provider that has not fetched anything yet
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            loaded: OnceCell::new(),
        }
    }

    /// Create a provider that is already resolved
    #[must_use]
    pub fn preloaded(config: RemoteConfig) -> Self {
        Self {
            loaded: OnceCell::new_with(Some(Ok(Rc::new(config.clone())))),
            source: Box::new(StaticConfigSource(config)),
        }
    }

    /// Wait for the configuration, fetching it on first use
    pub async fn load(&self) -> Result<Rc<RemoteConfig>> {
        let outcome = self
            .loaded
            .get_or_init(|| async {
                match self.source.fetch().await {
                    Ok(config) => match config.validate() {
                        Ok(()) => {
                            tracing::debug!(
                                region = %config.identity_provider.region,
                                "remote configuration loaded"
                            );
                            Ok(Rc::new(config))
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "remote configuration rejected");
                            Err(e.to_string())
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "remote configuration unavailable");
                        Err(e.to_string())
                    }
                }
            })
            .await;

        outcome.clone().map_err(SessionError::ConfigUnavailable)
    }

    /// The configuration if it has loaded successfully, without waiting
    #[must_use]
    pub fn get(&self) -> Option<Rc<RemoteConfig>> {
        self.loaded.get().and_then(|outcome| outcome.clone().ok())
    }

    /// Whether a load has finished, successfully or not
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.loaded.initialized()
    }
}
