//! Access tokens and the issuers that mint them.
//!
//! Tokens are minted on demand for a single scope and never cached. An
//! [`AccessToken`] can only be constructed inside this crate, on the
//! [`ScopeGuard`](crate::guard::ScopeGuard) path.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{IdentityError, IdentityResult};
use crate::scope::Scope;

/// Bound on a token exchange round trip.
pub const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

/// OAuth token endpoint; the local issuer is used when unset.
pub const TOKEN_URL_VAR: &str = "AGENT_AUTH_TOKEN_URL";

/// Short-lived credential proving an agent may act under one scope.
#[derive(Clone)]
pub struct AccessToken {
    value: SecretString,
    scope: Scope,
}

impl AccessToken {
    pub(crate) fn new(value: String, scope: Scope) -> Self {
        Self {
            value: SecretString::new(value.into()),
            scope,
        }
    }

    /// The scope this token was minted for.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Raw token value, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// `Bearer <token>` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("scope", &self.scope)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// A request to mint a token for one agent and one scope.
#[derive(Clone)]
pub struct TokenRequest {
    pub project_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub role: String,
    pub scope: Scope,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("project_id", &self.project_id)
            .field("client_id", &self.client_id)
            .field("role", &self.role)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Token material returned by an issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl IssuedToken {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("Bearer".to_string()),
            expires_in: None,
        }
    }
}

/// Mints tokens on behalf of agent contexts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Mint a token for the request's role and scope.
    async fn issue(&self, request: &TokenRequest) -> IdentityResult<IssuedToken>;
}

/// Mints opaque random tokens in-process.
///
/// Used for dry runs and tests when no token endpoint is configured.
#[derive(Debug, Default, Clone)]
pub struct LocalTokenIssuer;

impl LocalTokenIssuer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenIssuer for LocalTokenIssuer {
    async fn issue(&self, request: &TokenRequest) -> IdentityResult<IssuedToken> {
        debug!("Minting local token for {} ({})", request.role, request.scope);
        Ok(IssuedToken::bearer(format!("lt_{}", Uuid::new_v4().simple())))
    }
}

/// Exchanges client credentials for scoped tokens at an OAuth2 endpoint.
pub struct OAuthTokenIssuer {
    token_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OAuthTokenIssuer {
    pub fn new(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            client: reqwest::Client::new(),
            timeout: TOKEN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenIssuer for OAuthTokenIssuer {
    async fn issue(&self, request: &TokenRequest) -> IdentityResult<IssuedToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", request.client_id.as_str()),
            ("client_secret", request.client_secret.expose_secret()),
            ("scope", request.scope.as_str()),
            ("audience", request.project_id.as_str()),
            ("agent", request.role.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| IdentityError::TokenIssue(format!("Token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(IdentityError::scope_denied(&request.role, request.scope.as_str()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::TokenIssue(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let issued: IssuedToken = response
            .json()
            .await
            .map_err(|e| IdentityError::TokenIssue(format!("Malformed token response: {}", e)))?;

        if issued.access_token.trim().is_empty() {
            return Err(IdentityError::TokenIssue(
                "Token endpoint returned an empty access token".to_string(),
            ));
        }

        debug!(
            "Issued token for {} ({}), expires_in={:?}",
            request.role, request.scope, issued.expires_in
        );
        Ok(issued)
    }
}
