//! Show command - One pull request with its files, commits and comments.

use anyhow::{bail, Result};
use clap::Args;

use crewgate_agents::AgentRole;
use crewgate_github::{GetPullRequestDetail, Outcome, PrNumber, PullRequestDetail};

use super::connection::ConnectionArgs;
use super::{print_json, CrewFiles, OutputFormat};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Pull request number
    pub number: u64,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub async fn execute(args: ShowArgs, files: &CrewFiles) -> Result<()> {
    let crew = args.connection.crew(files.load()?)?;
    let tool = GetPullRequestDetail::new(crew.binding(AgentRole::PrAnalyzer)?);

    let outcome = tool.invoke(PrNumber(args.number)).await?;
    if args.format == OutputFormat::Json {
        print_json(&outcome)?;
    }

    let detail = match outcome {
        Outcome::Done(detail) => detail,
        Outcome::Failed(e) => bail!("Could not fetch pull request #{}: {}", args.number, e.error),
    };

    if args.format == OutputFormat::Text {
        print!("{}", render_text(&detail));
    }
    Ok(())
}

pub fn render_text(detail: &PullRequestDetail) -> String {
    let mut out = format!(
        "#{} {} [{}]\nby {}, updated {}\n{}\n",
        detail.number, detail.title, detail.state, detail.user, detail.updated_at, detail.url
    );

    if let Some(body) = detail.body.as_deref().filter(|b| !b.trim().is_empty()) {
        out.push_str(&format!("\n{}\n", body.trim()));
    }

    out.push_str(&format!(
        "\nFiles ({}, +{}/-{}):\n",
        detail.changed_files.len(),
        detail.total_additions(),
        detail.total_deletions()
    ));
    for file in &detail.changed_files {
        out.push_str(&format!(
            "  {:<9} {} (+{}/-{})\n",
            file.status, file.filename, file.additions, file.deletions
        ));
    }

    out.push_str(&format!("\nCommits ({}):\n", detail.commits.len()));
    for commit in &detail.commits {
        let short = commit.sha.get(..7).unwrap_or(&commit.sha);
        let subject = commit.message.lines().next().unwrap_or_default();
        out.push_str(&format!("  {} {} ({})\n", short, subject, commit.author));
    }

    out.push_str(&format!("\nComments ({}):\n", detail.comments.len()));
    for comment in &detail.comments {
        out.push_str(&format!("  {}: {}\n", comment.user, comment.body.trim()));
    }
    out
}
