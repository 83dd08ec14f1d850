//! Authorized calls to the backend API
//!
//! Credentials are read from the store for every call, never cached. A `401`
//! means the backend no longer accepts them, which ends the session.

use crate::error::{Result, SessionError};
use crate::lifecycle::SessionLifecycleManager;
use crate::session::ExpiryReason;
use crate::store::CredentialStoreExt;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::rc::Rc;

/// Paths of the analysis endpoints the pages call; all take a `POST`
pub struct ApiPaths;

impl ApiPaths {
    pub const UPLOAD: &'static str = "/upload";
    pub const DELETE_FILE: &'static str = "/delete";
    pub const ANALYZE: &'static str = "/bank/analyze";
    pub const SAVE_ANALYSIS: &'static str = "/bank/save-analysis";
    pub const MY_ANALYSES: &'static str = "/bank/my-analyses";
    pub const DELETE_ANALYSIS: &'static str = "/bank/delete-analysis";
}

/// Client for the backend API that follows the session's credentials
#[derive(Clone)]
pub struct ApiClient {
    manager: Rc<SessionLifecycleManager>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(manager: Rc<SessionLifecycleManager>) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing)
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// `POST` a JSON body and decode the JSON answer
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| SessionError::Api {
            status: 0,
            message: format!("could not encode request: {e}"),
        })?;
        self.send(path, body).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        let ctx = self.manager.context();
        let config = ctx.config().load().await?;

        // read after the wait so a concurrent refresh or logout is seen
        if !self.manager.state().is_live() {
            return Err(SessionError::NotAuthenticated);
        }
        let credentials = ctx
            .store()
            .credentials()
            .ok_or(SessionError::NotAuthenticated)?;
        let url = config.api.url(path)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&credentials.id_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::Api {
                status: 0,
                message: format!("request failed: {e}"),
            })?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "backend rejected stored credentials");
            self.manager.expire_session(ExpiryReason::Revoked);
            return Err(SessionError::NotAuthenticated);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(SessionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await.map_err(|e| SessionError::Api {
            status: status.as_u16(),
            message: format!("could not read response: {e}"),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| SessionError::Api {
            status: status.as_u16(),
            message: format!("unexpected response: {e}"),
        })
    }
}
