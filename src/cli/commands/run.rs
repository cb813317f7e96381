//! Run command implementation.
//!
//! Performs one conversion run and prints the summary.

use chrono::Utc;

use crate::cli::{Cli, RunArgs};
use crate::config::Config;
use crate::error::Result;
use crate::sync::SyncRunner;

/// Run the run command.
pub fn run(cli: &Cli, args: &RunArgs) -> Result<()> {
    let mut config = cli.load_config()?;
    apply_overrides(&mut config, args);

    let now = args.now.unwrap_or_else(Utc::now);
    let summary = SyncRunner::new(config).run(now)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !cli.quiet {
        println!("{summary}");
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(days) = args.inactive_days {
        config.inactive_days = days;
    }
    if args.shorts {
        config.shorts.enabled = true;
    }
    if args.archive {
        config.archive.enabled = true;
    }
    if args.no_agents {
        config.agents.include = false;
    }
}
