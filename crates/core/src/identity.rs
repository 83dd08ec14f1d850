//! Identity provider token endpoint: refresh exchange and password sign-in
//!
//! Both calls use the provider's `InitiateAuth` action. Every failure mode
//! (transport error, non-success status, unreadable body) collapses into one
//! error kind per operation, since the caller must react the same way to all
//! of them.

use crate::context::SessionContext;
use crate::error::{ClientError, Result, SessionError};
use crate::store::{CredentialPair, CredentialStoreExt};
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;
use url::Url;

const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'static str,
    client_id: &'a str,
    auth_parameters: BTreeMap<&'static str, &'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    challenge_name: Option<String>,
}

/// Tokens issued by the identity provider
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Sends one `InitiateAuth` call and returns the issued tokens
async fn initiate_auth(
    http: &reqwest::Client,
    endpoint: Url,
    request: &InitiateAuthRequest<'_>,
) -> std::result::Result<AuthenticationResult, ClientError> {
    let response = http
        .post(endpoint)
        .header("X-Amz-Target", INITIATE_AUTH_TARGET)
        .header(header::CONTENT_TYPE, AMZ_JSON)
        .body(serde_json::to_vec(request)?)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        return Err(ClientError::ServerError {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.bytes().await?;
    let parsed: InitiateAuthResponse = serde_json::from_slice(&body)?;
    match parsed.authentication_result {
        Some(result) if !result.access_token.is_empty() && !result.id_token.is_empty() => {
            Ok(result)
        }
        Some(_) => Err(ClientError::Malformed("empty token in response".into())),
        None => Err(ClientError::Malformed(format!(
            "no tokens issued (challenge: {})",
            parsed.challenge_name.as_deref().unwrap_or("none")
        ))),
    }
}

/// Exchanges the stored refresh token for new access and ID tokens
pub struct TokenRefreshClient {
    ctx: Rc<SessionContext>,
    http: reqwest::Client,
}

impl TokenRefreshClient {
    pub fn new(ctx: Rc<SessionContext>) -> Self {
        Self {
            ctx,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing)
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Refresh the access and ID tokens in the credential store.
    ///
    /// The refresh token is not rotated. If the store was cleared while the
    /// exchange was in flight, the new tokens are discarded.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] without any network call when no
    /// refresh token or no configuration is available, or when the session
    /// was torn down meanwhile; [`SessionError::RefreshRejected`] for every
    /// failure of the exchange itself.
    pub async fn refresh(&self) -> Result<()> {
        if self.ctx.store().refresh_token().is_none() {
            tracing::debug!("refresh skipped: no refresh token stored");
            return Err(SessionError::NotAuthenticated);
        }

        let Ok(config) = self.ctx.config().load().await else {
            tracing::debug!("refresh skipped: remote configuration unavailable");
            return Err(SessionError::NotAuthenticated);
        };
        let endpoint = config
            .identity_provider
            .token_endpoint()
            .map_err(|_| SessionError::NotAuthenticated)?;

        // re-read after the config wait: logout may have cleared the store
        let refresh_token = self
            .ctx
            .store()
            .refresh_token()
            .ok_or(SessionError::NotAuthenticated)?;

        let mut params = BTreeMap::new();
        params.insert("REFRESH_TOKEN", refresh_token.as_str());
        let request = InitiateAuthRequest {
            auth_flow: "REFRESH_TOKEN_AUTH",
            client_id: &config.identity_provider.client_id,
            auth_parameters: params,
        };

        let issued = match initiate_auth(&self.http, endpoint, &request).await {
            Ok(issued) => issued,
            Err(e) => {
                tracing::warn!(status = ?e.status(), error = %e, "token refresh rejected");
                return Err(SessionError::RefreshRejected);
            }
        };

        if self.ctx.store().refresh_token().as_deref() != Some(refresh_token.as_str()) {
            tracing::info!("session ended during refresh; discarding issued tokens");
            return Err(SessionError::NotAuthenticated);
        }

        self.ctx
            .store()
            .write_tokens(&issued.access_token, &issued.id_token)?;
        tracing::info!("access and id tokens refreshed");
        Ok(())
    }
}

/// Signs a user in with email and password
pub struct SignInClient {
    ctx: Rc<SessionContext>,
    http: reqwest::Client,
}

impl SignInClient {
    pub fn new(ctx: Rc<SessionContext>) -> Self {
        Self {
            ctx,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing)
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Exchange an email and password for a full credential pair.
    ///
    /// Nothing is written to the store; hand the pair to
    /// [`SessionLifecycleManager::begin`](crate::SessionLifecycleManager::begin).
    ///
    /// # Errors
    ///
    /// [`SessionError::ConfigUnavailable`] when the configuration never
    /// loaded, [`SessionError::SignInRejected`] for any failure of the call.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<CredentialPair> {
        let config = self.ctx.config().load().await?;
        let endpoint = config.identity_provider.token_endpoint()?;

        let mut params = BTreeMap::new();
        params.insert("USERNAME", email);
        params.insert("PASSWORD", password);
        let request = InitiateAuthRequest {
            auth_flow: "USER_PASSWORD_AUTH",
            client_id: &config.identity_provider.client_id,
            auth_parameters: params,
        };

        let issued = initiate_auth(&self.http, endpoint, &request)
            .await
            .map_err(|e| {
                tracing::warn!(status = ?e.status(), error = %e, "sign-in rejected");
                SessionError::SignInRejected
            })?;

        let refresh_token = issued.refresh_token.ok_or_else(|| {
            tracing::warn!("sign-in response carried no refresh token");
            SessionError::SignInRejected
        })?;

        Ok(CredentialPair {
            access_token: issued.access_token,
            id_token: issued.id_token,
            refresh_token,
            user_email: email.to_string(),
        })
    }
}
