//! Process credentials used to authenticate against the identity service.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{IdentityError, IdentityResult};

pub const PROJECT_ID_VAR: &str = "AGENT_AUTH_PROJECT_ID";
pub const CLIENT_ID_VAR: &str = "AGENT_AUTH_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AGENT_AUTH_CLIENT_SECRET";

/// Project and client credentials for the running process.
///
/// The client secret is wrapped in a [`SecretString`] so it never shows up
/// in `Debug` output or logs.
#[derive(Clone)]
pub struct Credentials {
    project_id: String,
    client_id: String,
    client_secret: SecretString,
}

impl Credentials {
    /// Create credentials, rejecting blank values.
    pub fn new(
        project_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> IdentityResult<Self> {
        let project_id = project_id.into().trim().to_string();
        let client_id = client_id.into().trim().to_string();
        let client_secret = client_secret.into();

        if project_id.is_empty() {
            return Err(IdentityError::AuthConfiguration(format!(
                "{} is missing",
                PROJECT_ID_VAR
            )));
        }
        if client_id.is_empty() {
            return Err(IdentityError::AuthConfiguration(format!(
                "{} is missing",
                CLIENT_ID_VAR
            )));
        }
        if client_secret.trim().is_empty() {
            return Err(IdentityError::AuthConfiguration(format!(
                "{} is missing",
                CLIENT_SECRET_VAR
            )));
        }

        Ok(Self {
            project_id,
            client_id,
            client_secret: SecretString::new(client_secret.into()),
        })
    }

    /// Read credentials from `AGENT_AUTH_*` environment variables.
    pub fn from_env() -> IdentityResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`, keyed by the `AGENT_AUTH_*` names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> IdentityResult<Self> {
        let read = |name: &str| lookup(name).unwrap_or_default();
        Self::new(
            read(PROJECT_ID_VAR),
            read(CLIENT_ID_VAR),
            read(CLIENT_SECRET_VAR),
        )
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Expose the client secret (only for the token exchange itself).
    pub fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_credentials_reject_blank_values() {
        let err = Credentials::new("", "client", "secret").unwrap_err();
        assert!(matches!(err, IdentityError::AuthConfiguration(_)));

        let err = Credentials::new("project", "  ", "secret").unwrap_err();
        assert!(err.to_string().contains(CLIENT_ID_VAR));

        let err = Credentials::new("project", "client", "").unwrap_err();
        assert!(err.to_string().contains(CLIENT_SECRET_VAR));
    }

    #[test]
    fn test_credentials_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (PROJECT_ID_VAR, "proj"),
            (CLIENT_ID_VAR, "client"),
            (CLIENT_SECRET_VAR, "secret"),
        ]
        .into_iter()
        .collect();

        let creds = Credentials::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.project_id(), "proj");
        assert_eq!(creds.client_id(), "client");
        assert_eq!(creds.client_secret(), "secret");
    }

    #[test]
    fn test_credentials_from_lookup_missing_vars() {
        let only_project = |k: &str| (k == PROJECT_ID_VAR).then(|| "proj".to_string());
        let err = Credentials::from_lookup(only_project).unwrap_err();
        assert!(matches!(err, IdentityError::AuthConfiguration(_)));
        assert!(err.to_string().contains(CLIENT_ID_VAR));

        let no_secret = |k: &str| match k {
            PROJECT_ID_VAR => Some("proj".to_string()),
            CLIENT_ID_VAR => Some("client".to_string()),
            _ => None,
        };
        let err = Credentials::from_lookup(no_secret).unwrap_err();
        assert!(err.to_string().contains(CLIENT_SECRET_VAR));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("project", "client", "hunter2").unwrap();
        let debug = format!("{:?}", creds);

        assert!(debug.contains("project"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(creds.client_secret(), "hunter2");
    }
}
