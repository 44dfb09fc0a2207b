//! Scopes command - Print which role may call which capability.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;

use crewgate_identity::ScopeGrants;

use super::{print_json, CrewFiles, OutputFormat};

#[derive(Args, Debug)]
pub struct ScopesArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn execute(args: ScopesArgs, files: &CrewFiles) -> Result<()> {
    let config = files.load()?;
    config.validate()?;
    let grants = config.grants();

    match args.format {
        OutputFormat::Json => print_json(&grant_table(&grants)),
        OutputFormat::Text => {
            print!("{}", render_text(&grants));
            Ok(())
        }
    }
}

fn grant_table(grants: &ScopeGrants) -> BTreeMap<String, Vec<String>> {
    grants
        .iter()
        .map(|(role, scopes)| {
            (
                role.to_string(),
                scopes.iter().map(|s| s.as_str().to_string()).collect(),
            )
        })
        .collect()
}

pub fn render_text(grants: &ScopeGrants) -> String {
    let mut out = String::new();
    for (role, scopes) in grants.iter() {
        out.push_str(&format!("{}:\n", role));
        for scope in scopes {
            out.push_str(&format!("  {}\n", scope));
        }
    }
    out
}
