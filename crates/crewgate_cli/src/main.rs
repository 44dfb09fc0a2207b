//! crewgate CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Configuration error
//! - 3: Scope denied
//! - 4: Pipeline aborted

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crewgate_agents::AgentError;
use crewgate_core::CoreError;
use crewgate_github::GitHubError;
use crewgate_identity::IdentityError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const CONFIGURATION: u8 = 2;
    pub const SCOPE_DENIED: u8 = 3;
    pub const ABORTED: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.files).await,
        Commands::List(args) => commands::list::execute(args, &cli.files).await,
        Commands::Show(args) => commands::show::execute(args, &cli.files).await,
        Commands::CheckConfig(args) => commands::check_config::execute(args, &cli.files),
        Commands::Scopes(args) => commands::scopes::execute(args, &cli.files),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Logs go to stderr so JSON reports on stdout stay parseable.
fn init_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,crewgate={}", level)));

    let registry = tracing_subscriber::registry().with(filter);
    let log_result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Walk the error chain for the most specific exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<CoreError>() {
            return core_exit_code(err);
        }
        if let Some(err) = cause.downcast_ref::<AgentError>() {
            return match err {
                AgentError::Core(inner) => core_exit_code(inner),
                AgentError::Identity(inner) if inner.is_denied() => ExitCodes::SCOPE_DENIED,
                AgentError::GitHub(GitHubError::Identity(inner)) if inner.is_denied() => {
                    ExitCodes::SCOPE_DENIED
                }
                other if other.is_configuration() => ExitCodes::CONFIGURATION,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<GitHubError>() {
            return match err {
                GitHubError::Identity(inner) => identity_exit_code(inner),
                GitHubError::InvalidRepository(_) | GitHubError::InvalidSettings(_) => {
                    ExitCodes::CONFIGURATION
                }
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<IdentityError>() {
            return identity_exit_code(err);
        }
    }
    ExitCodes::GENERAL_ERROR
}

fn core_exit_code(err: &CoreError) -> u8 {
    if err.is_scope_denied() {
        return ExitCodes::SCOPE_DENIED;
    }
    match err {
        CoreError::Aborted { .. } => ExitCodes::ABORTED,
        CoreError::Configuration(_) => ExitCodes::CONFIGURATION,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

fn identity_exit_code(err: &IdentityError) -> u8 {
    match err {
        IdentityError::ScopeDenied { .. } => ExitCodes::SCOPE_DENIED,
        IdentityError::AuthConfiguration(_) | IdentityError::InvalidScope(_) => {
            ExitCodes::CONFIGURATION
        }
        _ => ExitCodes::GENERAL_ERROR,
    }
}
