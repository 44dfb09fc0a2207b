//! List command - Open pull requests of the target repository.

use anyhow::{bail, Result};
use clap::Args;

use crewgate_agents::AgentRole;
use crewgate_github::{ListPullRequests, Outcome};

use super::connection::ConnectionArgs;
use super::{print_json, CrewFiles, OutputFormat};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub async fn execute(args: ListArgs, files: &CrewFiles) -> Result<()> {
    let crew = args.connection.crew(files.load()?)?;
    let tool = ListPullRequests::new(crew.binding(AgentRole::PrAnalyzer)?);

    let outcome = tool.invoke().await?;
    if args.format == OutputFormat::Json {
        print_json(&outcome.to_list_json()?)?;
    }

    let pulls = match outcome {
        Outcome::Done(pulls) => pulls,
        Outcome::Failed(e) => bail!("Could not list pull requests: {}", e.error),
    };

    if args.format == OutputFormat::Text {
        if pulls.is_empty() {
            println!("No open pull requests in {}", crew.repo());
        }
        for pr in &pulls {
            println!(
                "#{:<6} {:<50} {:<16} {}",
                pr.number, pr.title, pr.user, pr.updated_at
            );
        }
    }
    Ok(())
}
