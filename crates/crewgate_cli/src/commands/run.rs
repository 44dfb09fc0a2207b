//! Run command - Execute the full review pipeline.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crewgate_core::{ExecutionLog, PipelineState, StageState};

use super::connection::ConnectionArgs;
use super::{print_json, CrewFiles, OutputFormat};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub async fn execute(args: RunArgs, files: &CrewFiles) -> Result<()> {
    let config = files.load()?;
    let mut crew = args.connection.crew(config)?;
    info!("Reviewing open pull requests of {}", crew.repo());

    match crew.run().await {
        Ok(log) => report(&log, args.format),
        Err(e) => {
            // an aborted run still has a log worth showing
            if let Some(log) = e.execution_log() {
                report(log, args.format)?;
            }
            Err(e.into())
        }
    }
}

fn report(log: &ExecutionLog, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(log),
        OutputFormat::Text => {
            println!("{}", render_text(log));
            Ok(())
        }
    }
}

pub fn render_text(log: &ExecutionLog) -> String {
    let state = match log.state {
        PipelineState::NotStarted => "not started",
        PipelineState::InProgress => "in progress",
        PipelineState::Finished => "finished",
        PipelineState::Aborted => "aborted",
    };
    let mut out = format!("Pipeline {} {} ({})\n", log.pipeline, state, log.execution_id);

    let total = log.stages.len();
    for record in &log.stages {
        let status = match record.state {
            StageState::Pending => "skipped",
            StageState::Running => "running",
            StageState::Completed => "completed",
            StageState::Failed => "failed",
        };
        out.push_str(&format!(
            "\n[{}/{}] {} ({}) {}, {} tool call(s)",
            record.index + 1,
            total,
            record.stage,
            record.agent,
            status,
            record.tool_calls.len()
        ));
        let errors = record.structured_errors();
        if errors > 0 {
            out.push_str(&format!(", {} returned errors", errors));
        }
        out.push('\n');

        if let Some(output) = &record.output {
            for line in output.summary.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
        if let Some(error) = &record.error {
            out.push_str(&format!("    error: {}\n", error));
        }
    }
    out
}
