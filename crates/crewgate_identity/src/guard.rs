//! Scope enforcement around externally-effectful operations.
//!
//! Every capability routes its network path through [`ScopeGuard::run`]. The
//! guard checks the caller's scope, mints a token and only then invokes the
//! wrapped operation. A denied call never reaches the operation.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::{IdentityError, IdentityResult};
use crate::provider::AgentContext;
use crate::scope::Scope;
use crate::token::AccessToken;

/// Proof that a scope check passed, handed to the wrapped operation.
#[derive(Debug)]
pub struct GuardPass {
    role: String,
    scope: Scope,
    token: Option<AccessToken>,
}

impl GuardPass {
    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The minted token, present when the guard was built with `pass_token`.
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// The minted token, or an error if the guard withholds it.
    pub fn require_token(&self) -> IdentityResult<&AccessToken> {
        self.token.as_ref().ok_or_else(|| {
            IdentityError::TokenIssue(format!("Guard for {} does not pass its token", self.scope))
        })
    }

    pub fn into_token(self) -> Option<AccessToken> {
        self.token
    }
}

/// Wraps one capability's entry point with a scope check.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    required_scope: Scope,
    pass_token: bool,
}

impl ScopeGuard {
    pub fn new(required_scope: Scope, pass_token: bool) -> Self {
        Self {
            required_scope,
            pass_token,
        }
    }

    /// Guard for a capability name, passing the token through.
    pub fn for_tool(capability: &str) -> Self {
        Self::new(Scope::for_tool(capability), true)
    }

    pub fn required_scope(&self) -> &Scope {
        &self.required_scope
    }

    pub fn passes_token(&self) -> bool {
        self.pass_token
    }

    /// Authorize `context` and run `operation`.
    ///
    /// Fails with [`IdentityError::ScopeDenied`] before the operation is
    /// called if the context lacks the required scope. Authorization failures
    /// are never retried.
    pub async fn run<F, Fut, T>(&self, context: &AgentContext, operation: F) -> IdentityResult<T>
    where
        F: FnOnce(GuardPass) -> Fut,
        Fut: Future<Output = T>,
    {
        if !context.holds(&self.required_scope) {
            warn!(
                "Denied {} for agent {}",
                self.required_scope,
                context.role()
            );
            return Err(IdentityError::scope_denied(
                context.role(),
                self.required_scope.as_str(),
            ));
        }

        let token = context.mint(&self.required_scope).await?;
        debug!("Granted {} to agent {}", self.required_scope, context.role());

        let pass = GuardPass {
            role: context.role().to_string(),
            scope: self.required_scope.clone(),
            token: self.pass_token.then_some(token),
        };

        Ok(operation(pass).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::provider::IdentityProvider;
    use crate::scope::ScopeGrants;
    use crate::token::{IssuedToken, MockTokenIssuer};

    fn provider(issuer: MockTokenIssuer) -> IdentityProvider {
        IdentityProvider::new("proj", "client", "secret", false)
            .unwrap()
            .grants(ScopeGrants::new().grant("pr-reviewer-agent", Scope::for_tool("GitHubPRReviewTool")))
            .issuer(Arc::new(issuer))
            .build()
    }

    #[tokio::test]
    async fn test_denied_scope_never_runs_operation() {
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_issue().times(0);
        let provider = provider(issuer);
        let ctx = provider.create_agent_context("pr-analyzer-agent").unwrap();

        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let guard = ScopeGuard::for_tool("GitHubPRReviewTool");
        let result = guard
            .run(&ctx, move |_pass| async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert!(matches!(result, Err(IdentityError::ScopeDenied { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_granted_scope_injects_token() {
        let mut issuer = MockTokenIssuer::new();
        issuer
            .expect_issue()
            .times(1)
            .returning(|_| Ok(IssuedToken::bearer("tok-1")));
        let provider = provider(issuer);
        let ctx = provider.create_agent_context("pr-reviewer-agent").unwrap();

        let guard = ScopeGuard::for_tool("GitHubPRReviewTool");
        let bearer = guard
            .run(&ctx, |pass| async move { pass.require_token().map(|t| t.bearer()) })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(bearer, "Bearer tok-1");
    }

    #[tokio::test]
    async fn test_token_withheld_when_not_passed() {
        let mut issuer = MockTokenIssuer::new();
        issuer
            .expect_issue()
            .times(1)
            .returning(|_| Ok(IssuedToken::bearer("tok-2")));
        let provider = provider(issuer);
        let ctx = provider.create_agent_context("pr-reviewer-agent").unwrap();

        let guard = ScopeGuard::new(Scope::for_tool("GitHubPRReviewTool"), false);
        let had_token = guard
            .run(&ctx, |pass| async move { pass.token().is_some() })
            .await
            .unwrap();

        assert!(!had_token);
    }

    #[tokio::test]
    async fn test_issuer_failure_is_not_retried() {
        let mut issuer = MockTokenIssuer::new();
        issuer
            .expect_issue()
            .times(1)
            .returning(|_| Err(IdentityError::TokenIssue("down".to_string())));
        let provider = provider(issuer);
        let ctx = provider.create_agent_context("pr-reviewer-agent").unwrap();

        let guard = ScopeGuard::for_tool("GitHubPRReviewTool");
        let result = guard.run(&ctx, |_pass| async {}).await;

        assert!(matches!(result, Err(IdentityError::TokenIssue(_))));
    }
}
