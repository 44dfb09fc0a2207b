//! CLI command definitions.
//!
//! Each subcommand maps to one way of driving the review crew.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod check_config;
pub mod connection;
pub mod list;
pub mod run;
pub mod scopes;
pub mod show;

use crewgate_agents::CrewConfig;

/// crewgate - scope-guarded pull-request review crew
#[derive(Parser)]
#[command(name = "crewgate")]
#[command(version, about = "crewgate - scope-guarded pull-request review crew")]
#[command(long_about = r#"
crewgate runs a three-stage review crew against a repository. Every external
call is made under a short-lived token for a scope the calling role was granted.

COMMANDS:
  run           → Analyze open pull requests, review them and post reviews
  list          → List open pull requests as the analyzer role
  show          → Show one pull request with files, commits and comments
  check-config  → Validate the agent and task configuration
  scopes        → Print the scopes granted to each role

ENVIRONMENT:
  AGENT_AUTH_PROJECT_ID, AGENT_AUTH_CLIENT_ID, AGENT_AUTH_CLIENT_SECRET
  AGENT_AUTH_TOKEN_URL, GITHUB_REPO, GITHUB_API_BASE_URL,
  X_USER_ID, X_RESOURCE_URN

EXIT CODES:
  0 - Success
  1 - General error
  2 - Configuration error
  3 - Scope denied
  4 - Pipeline aborted
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub files: CrewFiles,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full review pipeline
    Run(run::RunArgs),

    /// List open pull requests
    List(list::ListArgs),

    /// Show one pull request in detail
    Show(show::ShowArgs),

    /// Validate the crew configuration
    #[command(name = "check-config")]
    CheckConfig(check_config::CheckConfigArgs),

    /// Print the scope grant table
    Scopes(scopes::ScopesArgs),
}

/// Overrides for the embedded crew configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct CrewFiles {
    /// Agents YAML file (defaults to the built-in personas)
    #[arg(long, global = true, value_name = "FILE")]
    pub agents: Option<PathBuf>,

    /// Tasks YAML file (defaults to the built-in task templates)
    #[arg(long, global = true, value_name = "FILE")]
    pub tasks: Option<PathBuf>,
}

impl CrewFiles {
    pub fn load(&self) -> anyhow::Result<CrewConfig> {
        Ok(CrewConfig::load(self.agents.as_deref(), self.tasks.as_deref())?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
