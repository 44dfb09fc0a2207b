//! Process-wide identity provider and per-role agent contexts.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use tracing::{debug, info, info_span, Instrument};

use crate::credentials::Credentials;
use crate::error::{IdentityError, IdentityResult};
use crate::scope::{Scope, ScopeGrants};
use crate::token::{AccessToken, LocalTokenIssuer, TokenIssuer, TokenRequest};

/// The authenticated process-wide principal.
///
/// Owned by the [`IdentityProvider`]; agent contexts only hold weak
/// references to it.
pub struct Identity {
    credentials: Credentials,
    tracing: bool,
    issuer: Arc<dyn TokenIssuer>,
    grants: ScopeGrants,
}

impl Identity {
    pub fn project_id(&self) -> &str {
        self.credentials.project_id()
    }

    pub fn client_id(&self) -> &str {
        self.credentials.client_id()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("credentials", &self.credentials)
            .field("tracing", &self.tracing)
            .field("grants", &self.grants)
            .finish_non_exhaustive()
    }
}

/// Builder for an [`IdentityProvider`].
pub struct IdentityProviderBuilder {
    credentials: Credentials,
    tracing: bool,
    issuer: Option<Arc<dyn TokenIssuer>>,
    grants: ScopeGrants,
}

impl std::fmt::Debug for IdentityProviderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProviderBuilder")
            .field("credentials", &self.credentials)
            .field("tracing", &self.tracing)
            .field("grants", &self.grants)
            .finish_non_exhaustive()
    }
}

impl IdentityProviderBuilder {
    /// Emit a tracing span around every token mint.
    pub fn tracing(mut self, enabled: bool) -> Self {
        self.tracing = enabled;
        self
    }

    /// Use the given token issuer (defaults to [`LocalTokenIssuer`]).
    pub fn issuer(mut self, issuer: Arc<dyn TokenIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Set the role → scope grant table.
    pub fn grants(mut self, grants: ScopeGrants) -> Self {
        self.grants = grants;
        self
    }

    pub fn build(self) -> IdentityProvider {
        let identity = Identity {
            credentials: self.credentials,
            tracing: self.tracing,
            issuer: self
                .issuer
                .unwrap_or_else(|| Arc::new(LocalTokenIssuer::new())),
            grants: self.grants,
        };
        info!(
            "Identity provider ready for project {} (client {})",
            identity.project_id(),
            identity.client_id()
        );
        IdentityProvider {
            identity: Arc::new(identity),
        }
    }
}

/// Authenticates the process once and hands out per-role contexts.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    identity: Arc<Identity>,
}

impl IdentityProvider {
    /// Start building a provider from validated credentials.
    pub fn builder(credentials: Credentials) -> IdentityProviderBuilder {
        IdentityProviderBuilder {
            credentials,
            tracing: false,
            issuer: None,
            grants: ScopeGrants::default(),
        }
    }

    /// Create a provider from raw credential values.
    ///
    /// Fails with [`IdentityError::AuthConfiguration`] if any value is blank.
    pub fn new(
        project_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tracing: bool,
    ) -> IdentityResult<IdentityProviderBuilder> {
        let credentials = Credentials::new(project_id, client_id, client_secret)?;
        Ok(Self::builder(credentials).tracing(tracing))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn grants(&self) -> &ScopeGrants {
        &self.identity.grants
    }

    /// Create the identity context for an agent role.
    ///
    /// No network call is made; tokens are minted lazily per invocation.
    pub fn create_agent_context(&self, role: &str) -> IdentityResult<AgentContext> {
        let role = role.trim();
        if role.is_empty() {
            return Err(IdentityError::AuthConfiguration(
                "Agent role name must not be empty".to_string(),
            ));
        }

        let scopes = self.identity.grants.scopes_for(role);
        debug!("Created agent context {} with {} scope(s)", role, scopes.len());

        Ok(AgentContext {
            role: role.to_string(),
            scopes,
            identity: Arc::downgrade(&self.identity),
        })
    }
}

/// A role-bound identity handle.
///
/// Immutable after creation. Checks scope membership and mints tokens only for
/// scopes granted to its role.
#[derive(Debug, Clone)]
pub struct AgentContext {
    role: String,
    scopes: BTreeSet<Scope>,
    identity: Weak<Identity>,
}

impl AgentContext {
    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn scopes(&self) -> &BTreeSet<Scope> {
        &self.scopes
    }

    /// Whether this context holds the scope.
    pub fn holds(&self, scope: &Scope) -> bool {
        self.scopes.contains(scope)
    }

    /// Mint a token for a held scope.
    pub(crate) async fn mint(&self, scope: &Scope) -> IdentityResult<AccessToken> {
        if !self.holds(scope) {
            return Err(IdentityError::scope_denied(&self.role, scope.as_str()));
        }

        let identity = self
            .identity
            .upgrade()
            .ok_or_else(|| IdentityError::ContextExpired(self.role.clone()))?;

        let request = TokenRequest {
            project_id: identity.credentials.project_id().to_string(),
            client_id: identity.credentials.client_id().to_string(),
            client_secret: secrecy::SecretString::new(
                identity.credentials.client_secret().into(),
            ),
            role: self.role.clone(),
            scope: scope.clone(),
        };

        let issued = if identity.tracing {
            let span = info_span!("mint_token", agent = %self.role, scope = %scope);
            identity.issuer.issue(&request).instrument(span).await?
        } else {
            identity.issuer.issue(&request).await?
        };

        if issued.access_token.trim().is_empty() {
            return Err(IdentityError::TokenIssue(format!(
                "Empty token issued for {}",
                scope
            )));
        }

        Ok(AccessToken::new(issued.access_token, scope.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{IssuedToken, MockTokenIssuer};

    fn grants() -> ScopeGrants {
        ScopeGrants::new()
            .grant("pr-analyzer-agent", Scope::for_tool("GitHubPRListTool"))
            .grant("pr-analyzer-agent", Scope::for_tool("GitHubPRDetailsTool"))
            .grant("code-reviewer-agent", Scope::for_tool("GitHubPRDetailsTool"))
    }

    fn provider_with(issuer: Arc<dyn TokenIssuer>) -> IdentityProvider {
        IdentityProvider::new("proj", "client", "secret", true)
            .unwrap()
            .grants(grants())
            .issuer(issuer)
            .build()
    }

    #[test]
    fn test_missing_credentials_fail_configuration() {
        let err = IdentityProvider::new("proj", "", "secret", false).unwrap_err();
        assert!(matches!(err, IdentityError::AuthConfiguration(_)));
    }

    #[test]
    fn test_same_role_contexts_are_equivalent() {
        let provider = provider_with(Arc::new(LocalTokenIssuer::new()));
        let a = provider.create_agent_context("pr-analyzer-agent").unwrap();
        let b = provider.create_agent_context("pr-analyzer-agent").unwrap();

        assert_eq!(a.scopes(), b.scopes());
    }

    #[test]
    fn test_roles_do_not_share_grants() {
        let provider = provider_with(Arc::new(LocalTokenIssuer::new()));
        let analyzer = provider.create_agent_context("pr-analyzer-agent").unwrap();
        let reviewer = provider.create_agent_context("code-reviewer-agent").unwrap();
        let stranger = provider.create_agent_context("unknown-agent").unwrap();

        assert!(analyzer.holds(&Scope::for_tool("GitHubPRListTool")));
        assert!(!reviewer.holds(&Scope::for_tool("GitHubPRListTool")));
        assert!(stranger.scopes().is_empty());
    }

    #[test]
    fn test_creating_context_does_not_mint() {
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_issue().times(0);

        let provider = provider_with(Arc::new(issuer));
        provider.create_agent_context("pr-analyzer-agent").unwrap();
    }

    #[tokio::test]
    async fn test_mint_passes_role_and_scope_to_issuer() {
        let mut issuer = MockTokenIssuer::new();
        issuer
            .expect_issue()
            .withf(|req| {
                req.role == "code-reviewer-agent"
                    && req.scope.as_str() == "app:tool:GitHubPRDetailsTool"
                    && req.project_id == "proj"
            })
            .times(1)
            .returning(|_| Ok(IssuedToken::bearer("minted")));

        let provider = provider_with(Arc::new(issuer));
        let ctx = provider.create_agent_context("code-reviewer-agent").unwrap();
        let token = ctx
            .mint(&Scope::for_tool("GitHubPRDetailsTool"))
            .await
            .unwrap();

        assert_eq!(token.expose(), "minted");
    }

    #[tokio::test]
    async fn test_mint_denies_ungranted_scope_without_issuing() {
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_issue().times(0);

        let provider = provider_with(Arc::new(issuer));
        let ctx = provider.create_agent_context("code-reviewer-agent").unwrap();
        let err = ctx
            .mint(&Scope::for_tool("GitHubPRReviewTool"))
            .await
            .unwrap_err();

        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn test_context_expires_with_provider() {
        let provider = provider_with(Arc::new(LocalTokenIssuer::new()));
        let ctx = provider.create_agent_context("pr-analyzer-agent").unwrap();
        drop(provider);

        let err = ctx
            .mint(&Scope::for_tool("GitHubPRListTool"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::ContextExpired(_)));
    }
}
