//! Check command - report which external tools are available.

use clap::Args;
use console::style;

use invsplit_core::check_tools;

use super::load_config;

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Exit with an error if any tool is missing
    #[arg(long)]
    strict: bool,
}

pub async fn run(args: CheckArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let statuses = check_tools(&config);

    for status in &statuses {
        match &status.path {
            Some(path) => println!(
                "{} {:<12} {} ({})",
                style("✓").green(),
                status.name,
                path.display(),
                status.purpose
            ),
            None => println!(
                "{} {:<12} not found ({})",
                style("✗").red(),
                status.name,
                status.purpose
            ),
        }
    }

    let missing = statuses.iter().filter(|s| !s.is_available()).count();
    if missing > 0 && args.strict {
        anyhow::bail!("{} required tool(s) missing", missing);
    }

    Ok(())
}
