//! Process configuration shared by the commands that reach the API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use crewgate_agents::{CrewConfig, ReviewCrew};
use crewgate_github::{ApiSettings, RepoTarget};
use crewgate_identity::token::TOKEN_URL_VAR;
use crewgate_identity::{Credentials, OAuthTokenIssuer};

/// Connection flags. Each one overrides the matching environment variable;
/// credentials are only read from `AGENT_AUTH_*`.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Target repository as owner/repo [default: $GITHUB_REPO or securebotinc/ai-gateway]
    #[arg(long)]
    pub repo: Option<String>,

    /// Base URL of the review-hosting API [default: $GITHUB_API_BASE_URL]
    #[arg(long)]
    pub api_url: Option<String>,

    /// Value of the X-USER-ID header [default: $X_USER_ID]
    #[arg(long)]
    pub user_id: Option<String>,

    /// Value of the X-RESOURCE-URN header [default: $X_RESOURCE_URN]
    #[arg(long)]
    pub resource_urn: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// OAuth token endpoint (tokens are minted locally when unset)
    #[arg(long, env = TOKEN_URL_VAR)]
    pub token_url: Option<String>,

    /// Wrap every token mint in a tracing span
    #[arg(long)]
    pub trace_tokens: bool,
}

impl ConnectionArgs {
    pub fn repo(&self) -> Result<RepoTarget> {
        match self.repo.as_deref() {
            Some(repo) => Ok(RepoTarget::parse(repo)?),
            None => Ok(RepoTarget::from_env()?),
        }
    }

    pub fn settings(&self) -> ApiSettings {
        let mut settings = ApiSettings::from_env();
        if let Some(url) = &self.api_url {
            settings = settings.with_base_url(url);
        }
        if let Some(user_id) = &self.user_id {
            settings.user_id = user_id.clone();
        }
        if let Some(urn) = &self.resource_urn {
            settings.resource_urn = urn.clone();
        }
        if let Some(secs) = self.timeout {
            settings = settings.with_timeout(Duration::from_secs(secs));
        }
        settings
    }

    /// Build the review crew for this process.
    pub fn crew(&self, config: CrewConfig) -> Result<ReviewCrew> {
        let credentials = Credentials::from_env().context("Missing identity credentials")?;
        self.crew_with(config, credentials)
    }

    pub fn crew_with(&self, config: CrewConfig, credentials: Credentials) -> Result<ReviewCrew> {
        let mut builder = ReviewCrew::builder(config)
            .credentials(credentials)
            .repo(self.repo()?)
            .settings(self.settings())
            .tracing(self.trace_tokens);

        match self.token_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                info!("Minting tokens at {}", url);
                builder = builder.issuer(Arc::new(OAuthTokenIssuer::new(url)));
            }
            _ => debug!("Minting tokens locally"),
        }

        builder.build().context("Failed to build the review crew")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    fn connection(extra: &[&str]) -> ConnectionArgs {
        let mut argv = vec!["crewgate", "list"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::List(args) => args.connection,
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_settings_from_flags() {
        let args = connection(&[
            "--api-url",
            "http://api.test/",
            "--user-id",
            "user-1",
            "--resource-urn",
            "urn:res:1",
            "--timeout",
            "3",
        ]);
        let settings = args.settings();
        assert_eq!(settings.base_url, "http://api.test");
        assert_eq!(settings.user_id, "user-1");
        assert_eq!(settings.resource_urn, "urn:res:1");
        assert_eq!(settings.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_settings_default_to_environment() {
        let args = connection(&[]);
        assert_eq!(args.settings(), ApiSettings::from_env());
        assert!(args.repo.is_none());
    }

    #[test]
    fn test_malformed_repo_rejected() {
        let args = connection(&["--repo", "not-a-repo"]);
        assert!(args.repo().is_err());
    }

    #[test]
    fn test_crew_builds_with_credentials() {
        let args = connection(&[
            "--repo",
            "octo/widgets",
            "--api-url",
            "http://api.test",
        ]);
        let credentials = Credentials::new("proj", "client", "secret").unwrap();
        let crew = args
            .crew_with(CrewConfig::embedded().unwrap(), credentials)
            .unwrap();
        assert_eq!(crew.repo().to_string(), "octo/widgets");
    }
}
