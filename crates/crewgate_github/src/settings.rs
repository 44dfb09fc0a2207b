//! Process-wide API settings.
//!
//! Read once at start-up and passed into capabilities explicitly; capability
//! code never consults the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GitHubError, GitHubResult};

pub const DEFAULT_BASE_URL: &str = "https://github.eastus.dev.securebot.io";
pub const API_ACCEPT: &str = "application/vnd.github.v3+json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const BASE_URL_VAR: &str = "GITHUB_API_BASE_URL";
pub const USER_ID_VAR: &str = "X_USER_ID";
pub const RESOURCE_URN_VAR: &str = "X_RESOURCE_URN";

/// Settings shared by every request to the review-hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// `Accept` media type
    pub accept: String,
    /// Value of the `X-USER-ID` header
    pub user_id: String,
    /// Value of the `X-RESOURCE-URN` header
    pub resource_urn: String,
    /// Per-request timeout
    #[serde(with = "timeout_secs")]
    pub timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            accept: API_ACCEPT.to_string(),
            user_id: String::new(),
            resource_urn: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Read settings from `GITHUB_API_BASE_URL`, `X_USER_ID` and `X_RESOURCE_URN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            settings = settings.with_base_url(url);
        }
        settings.user_id = lookup(USER_ID_VAR).unwrap_or_default();
        settings.resource_urn = lookup(RESOURCE_URN_VAR).unwrap_or_default();
        settings
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_identity_headers(
        mut self,
        user_id: impl Into<String>,
        resource_urn: impl Into<String>,
    ) -> Self {
        self.user_id = user_id.into();
        self.resource_urn = resource_urn.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the settings before any request is built.
    pub fn validate(&self) -> GitHubResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(GitHubError::InvalidSettings(format!(
                "Base URL must be http(s): '{}'",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(GitHubError::InvalidSettings(
                "Timeout must be greater than zero".to_string(),
            ));
        }
        if self.user_id.is_empty() || self.resource_urn.is_empty() {
            warn!(
                "{} or {} is empty; the API may reject or misattribute requests",
                USER_ID_VAR, RESOURCE_URN_VAR
            );
        }
        Ok(())
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(timeout: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(timeout.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
