//! # crewgate_identity
//!
//! Identity and authorization layer for crewgate agents.
//!
//! # Architecture
//!
//! - **IdentityProvider**: authenticates the process once and creates agent contexts
//! - **AgentContext**: role-bound handle that knows its granted scopes
//! - **ScopeGuard**: the single choke point every external call passes through
//! - **TokenIssuer**: mints short-lived, single-scope access tokens
//!
//! # Example
//!
//! ```rust,ignore
//! use crewgate_identity::{IdentityProvider, Scope, ScopeGrants, ScopeGuard};
//!
//! let grants = ScopeGrants::new()
//!     .grant("pr-analyzer-agent", Scope::for_tool("GitHubPRListTool"));
//!
//! let provider = IdentityProvider::new(project_id, client_id, secret, true)?
//!     .grants(grants)
//!     .build();
//!
//! let ctx = provider.create_agent_context("pr-analyzer-agent")?;
//! let guard = ScopeGuard::for_tool("GitHubPRListTool");
//! let value = guard.run(&ctx, |pass| async move { call_api(pass).await }).await?;
//! ```

pub mod credentials;
pub mod error;
pub mod guard;
pub mod provider;
pub mod scope;
pub mod token;

pub use credentials::Credentials;
pub use error::{IdentityError, IdentityResult};
pub use guard::{GuardPass, ScopeGuard};
pub use provider::{AgentContext, Identity, IdentityProvider, IdentityProviderBuilder};
pub use scope::{Scope, ScopeGrants};
pub use token::{AccessToken, IssuedToken, LocalTokenIssuer, OAuthTokenIssuer, TokenIssuer, TokenRequest};
