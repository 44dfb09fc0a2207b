//! Scope strings and per-role grant tables.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, IdentityResult};

/// A named permission of the form `app:tool:<CapabilityName>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope(String);

impl Scope {
    pub const TOOL_PREFIX: &'static str = "app:tool:";

    /// Scope guarding the named capability.
    pub fn for_tool(capability: &str) -> Self {
        Self(format!("{}{}", Self::TOOL_PREFIX, capability))
    }

    /// Parse a scope string, requiring the tool prefix and a capability name.
    pub fn parse(value: &str) -> IdentityResult<Self> {
        match value.strip_prefix(Self::TOOL_PREFIX) {
            Some(name) if !name.is_empty() && !name.contains(char::is_whitespace) => {
                Ok(Self(value.to_string()))
            }
            _ => Err(IdentityError::InvalidScope(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The capability identifier this scope guards.
    pub fn capability(&self) -> &str {
        &self.0[Self::TOOL_PREFIX.len()..]
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Scope {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.0
    }
}

/// Explicit table of which scopes each agent role may exercise.
///
/// Roles that are not listed hold no scopes at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeGrants {
    grants: BTreeMap<String, BTreeSet<Scope>>,
}

impl ScopeGrants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a scope to a role.
    pub fn grant(mut self, role: impl Into<String>, scope: Scope) -> Self {
        self.insert(role, scope);
        self
    }

    pub fn insert(&mut self, role: impl Into<String>, scope: Scope) {
        self.grants.entry(role.into()).or_default().insert(scope);
    }

    /// Scopes held by a role.
    pub fn scopes_for(&self, role: &str) -> BTreeSet<Scope> {
        self.grants.get(role).cloned().unwrap_or_default()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.grants.keys().map(|r| r.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Scope>)> {
        self.grants.iter().map(|(r, s)| (r.as_str(), s))
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
