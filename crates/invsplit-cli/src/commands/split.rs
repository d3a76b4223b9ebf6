//! Split command - split one or more scanned PDFs into per-invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, error, warn};

use invsplit_core::segment::BatchReport;

use super::{cancel_on_ctrl_c, display_name, load_config, FileOutcome, Pipeline};

/// Arguments for the split command.
#[derive(Args)]
pub struct SplitArgs {
    /// Input PDF files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (default: from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ReportFormat,

    /// Also write the JSON report to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ReportFormat {
    /// Plain text summary
    Text,
    /// JSON output
    Json,
}

/// Everything one invocation produced.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub files: Vec<FileOutcome>,
    pub global: BatchReport,
}

pub async fn run(args: SplitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut run_report = RunReport {
        files: Vec::new(),
        global: BatchReport::new(),
    };

    let inputs = existing_inputs(&args.inputs, &mut run_report.global);
    if inputs.is_empty() {
        anyhow::bail!("No input files found");
    }

    let cancel = cancel_on_ctrl_c();
    let mut pipeline = Pipeline::new(&config, args.output_dir.clone(), cancel, true)?;

    for input in &inputs {
        let name = display_name(input);
        match pipeline.process(input) {
            Ok(outcome) => {
                run_report.global.absorb(&name, &outcome.report);
                let cancelled = outcome.report.cancelled();
                run_report.files.push(outcome);
                if cancelled {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to process {}: {:#}", input.display(), e);
                run_report.global.record_failure(&name, &format!("{:#}", e));
            }
        }
    }

    match args.format {
        ReportFormat::Text => print_text(&run_report),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&run_report)?),
    }

    if let Some(report_path) = &args.report {
        fs::write(report_path, serde_json::to_string_pretty(&run_report)?)?;
        println!(
            "{} Report written to {}",
            style("✓").green(),
            report_path.display()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Inputs that exist on disk; missing ones are recorded as failures.
fn existing_inputs<'a>(inputs: &'a [PathBuf], report: &mut BatchReport) -> Vec<&'a Path> {
    inputs
        .iter()
        .filter(|input| {
            if input.exists() {
                return true;
            }
            warn!("Input file not found: {}", input.display());
            report.record_failure(&display_name(input), "input file not found");
            false
        })
        .map(PathBuf::as_path)
        .collect()
}

pub fn print_text(run_report: &RunReport) {
    for file in &run_report.files {
        let report = &file.report;
        println!(
            "{} {}: {} pages, {} documents",
            style("✓").green(),
            file.source.display(),
            report.total_pages(),
            report.total_documents()
        );
        for doc in &file.documents {
            println!("   {} ({} pages) -> {}", doc.key, doc.pages, doc.path.display());
        }
        for err in report.errors() {
            println!("   {} {}", style("✗").red(), err);
        }
        if report.cancelled() {
            println!("   {}", style("cancelled before the last page").yellow());
        }
    }

    println!();
    print!("{}", run_report.global.render());

    if !run_report.global.errors.is_empty() {
        println!();
        println!("{}", style("Errors:").red());
        for err in &run_report.global.errors {
            println!("  - {}", err);
        }
    }
}
