//! CLI application for splitting scanned invoice batches.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{batch, check, config, split};

/// Invoice splitter - Split scanned invoice batches into one PDF per invoice
#[derive(Parser)]
#[command(name = "invsplit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug for invsplit crates, -vvv everything)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split one or more scanned PDFs
    Split(split::SplitArgs),

    /// Split every PDF matching a glob pattern
    Batch(batch::BatchArgs),

    /// Check that the external tools are installed
    Check(check::CheckArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

/// `RUST_LOG` wins; otherwise each `-v` widens the filter.
fn log_filter(verbose: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(verbosity_directive(verbose))
}

fn verbosity_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        // Keep pdf and image crates quiet until -vvv.
        2 => "warn,invsplit=debug,invsplit_core=debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Split(args) => split::run(args, cli.config.as_deref()).await,
        Commands::Batch(args) => batch::run(args, cli.config.as_deref()).await,
        Commands::Check(args) => check::run(args, cli.config.as_deref()).await,
        Commands::Config(args) => config::run(args, cli.config.as_deref()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_directives() {
        assert_eq!(verbosity_directive(0), "warn");
        assert_eq!(verbosity_directive(1), "info");
        assert!(verbosity_directive(2).contains("invsplit_core=debug"));
        assert_eq!(verbosity_directive(7), "trace");
    }
}
