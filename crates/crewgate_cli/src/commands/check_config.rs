//! Check-config command - Validate the crew configuration.

use anyhow::Result;
use clap::Args;

use crewgate_agents::{AgentRole, CrewConfig, TASK_ORDER};

use super::CrewFiles;

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn execute(args: CheckConfigArgs, files: &CrewFiles) -> Result<()> {
    let config = files.load()?;
    config.validate()?;

    if !args.quiet {
        print!("{}", render_text(&config));
    }
    Ok(())
}

pub fn render_text(config: &CrewConfig) -> String {
    let mut out = String::from("Agents:\n");
    for role in AgentRole::all() {
        if let Some(agent) = config.agent(role) {
            out.push_str(&format!(
                "  {} ({}): {} [{}]\n",
                role.config_key(),
                role,
                agent.role.trim(),
                agent.tools.join(", ")
            ));
        }
    }

    out.push_str("Tasks:\n");
    for (i, name) in TASK_ORDER.iter().enumerate() {
        if let Some(task) = config.tasks.get(*name) {
            out.push_str(&format!("  {}. {} -> {}\n", i + 1, name, task.agent));
        }
    }
    out.push_str("Configuration is valid\n");
    out
}
