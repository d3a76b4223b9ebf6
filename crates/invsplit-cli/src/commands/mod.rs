//! CLI subcommands and the per-file pipeline they share.

pub mod batch;
pub mod check;
pub mod config;
pub mod split;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use invsplit_core::pdf::{rasterizer_for, OutputNamer, PdfWriter, Rasterizer};
use invsplit_core::segment::{Report, Segmenter};
use invsplit_core::{segmenter_from_config, SplitConfig};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invsplit")
        .join("config.json")
}

/// Load the configuration: the explicit path, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SplitConfig> {
    if let Some(path) = config_path {
        return SplitConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        return SplitConfig::from_file(&default_path)
            .with_context(|| format!("Failed to read config file {}", default_path.display()));
    }

    Ok(SplitConfig::default())
}

/// Flag set on Ctrl-C; the segmenter stops before the next page.
pub fn cancel_on_ctrl_c() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing current page");
            handle.store(true, Ordering::Relaxed);
        }
    });
    flag
}

/// One bucket written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenDocument {
    pub key: String,
    pub pages: usize,
    pub path: PathBuf,
}

/// Result of splitting one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub report: Report,
    pub documents: Vec<WrittenDocument>,
}

/// Rasterize, segment and write, one input file at a time.
///
/// The output namer lives here so keys repeated across files in one
/// invocation get numbered suffixes instead of overwriting each other.
pub struct Pipeline {
    rasterizer: Box<dyn Rasterizer>,
    segmenter: Segmenter,
    writer: PdfWriter,
    namer: OutputNamer,
    output_dir: PathBuf,
    dpi: u32,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(
        config: &SplitConfig,
        output_dir: Option<PathBuf>,
        cancel: Arc<AtomicBool>,
        show_progress: bool,
    ) -> anyhow::Result<Self> {
        let segmenter = segmenter_from_config(config)
            .context("Failed to set up decoders (run `invsplit check`)")?
            .with_cancel_flag(cancel);

        let output_dir = output_dir.unwrap_or_else(|| config.output.directory.clone());
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        Ok(Self {
            rasterizer: rasterizer_for(&config.pdf),
            segmenter,
            writer: PdfWriter::new(config.pdf.render_dpi, config.pdf.jpeg_quality),
            namer: OutputNamer::new(config.output.file_prefix.clone()),
            output_dir,
            dpi: config.pdf.render_dpi,
            show_progress,
        })
    }

    pub fn process(&mut self, path: &Path) -> anyhow::Result<FileOutcome> {
        info!("Processing PDF: {}", path.display());

        let pages = self
            .rasterizer
            .rasterize(path, self.dpi)
            .with_context(|| format!("Failed to rasterize {}", path.display()))?;
        debug!("Rasterized {} pages", pages.len());

        let pb = if self.show_progress {
            ProgressBar::new(pages.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")?
                .progress_chars("=>-"),
        );

        let segmentation = self.segmenter.segment_with_progress(&pages, |progress| {
            pb.set_message(progress.key.to_string());
            pb.inc(1);
        })?;
        pb.finish_and_clear();

        let mut documents = Vec::new();
        for bucket in segmentation.buckets() {
            let file_name = self.namer.file_name(&bucket.key);
            let output_path = self.output_dir.join(file_name);

            self.writer
                .write(bucket.pages(), &output_path)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            if bucket.key.is_sentinel() {
                warn!(
                    "{} page(s) without an invoice identifier written to {}",
                    bucket.len(),
                    output_path.display()
                );
            }

            documents.push(WrittenDocument {
                key: bucket.key.to_string(),
                pages: bucket.len(),
                path: output_path,
            });
        }

        Ok(FileOutcome {
            source: path.to_path_buf(),
            report: segmentation.report().clone(),
            documents,
        })
    }
}

/// Display name of an input file for reports.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
