//! Batch command - split every PDF matching a glob pattern.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use invsplit_core::segment::BatchReport;

use super::split::{print_text, ReportFormat, RunReport};
use super::{cancel_on_ctrl_c, display_name, load_config, FileOutcome, Pipeline};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input PDFs (e.g. "scans/*.pdf")
    #[arg(required = true)]
    input: String,

    /// Output directory (default: from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ReportFormat,

    /// Also write a CSV with one row per output document
    #[arg(long)]
    summary: Option<PathBuf>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let cancel = cancel_on_ctrl_c();
    let mut pipeline = Pipeline::new(&config, args.output_dir.clone(), cancel, false)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut run_report = RunReport {
        files: Vec::new(),
        global: BatchReport::new(),
    };

    for path in &files {
        let name = display_name(path);
        match pipeline.process(path) {
            Ok(outcome) => {
                run_report.global.absorb(&name, &outcome.report);
                let cancelled = outcome.report.cancelled();
                run_report.files.push(outcome);
                if cancelled {
                    break;
                }
            }
            Err(e) => {
                warn!("Failed to process {}: {:#}", path.display(), e);
                run_report.global.record_failure(&name, &format!("{:#}", e));
            }
        }
        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &run_report.files)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    match args.format {
        ReportFormat::Text => print_text(&run_report),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&run_report)?),
    }

    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        run_report.global.total_pdfs,
        start.elapsed()
    );

    Ok(())
}

fn write_summary(path: &Path, files: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["source", "key", "pages", "output"])?;

    for file in files {
        let source = display_name(&file.source);
        for doc in &file.documents {
            wtr.write_record([
                source.as_str(),
                doc.key.as_str(),
                &doc.pages.to_string(),
                &doc.path.display().to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use invsplit_core::segment::Report;
    use super::super::WrittenDocument;

    #[test]
    fn test_summary_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let files = vec![FileOutcome {
            source: PathBuf::from("scans/batch1.pdf"),
            report: Report::default(),
            documents: vec![
                WrittenDocument {
                    key: "2065815440".to_string(),
                    pages: 2,
                    path: PathBuf::from("output/invoice_2065815440.pdf"),
                },
                WrittenDocument {
                    key: "UNASSIGNED".to_string(),
                    pages: 1,
                    path: PathBuf::from("output/invoice_UNASSIGNED.pdf"),
                },
            ],
        }];

        write_summary(&path, &files).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "source,key,pages,output");
        assert_eq!(lines[1], "batch1.pdf,2065815440,2,output/invoice_2065815440.pdf");
        assert_eq!(lines.len(), 3);
    }
}
