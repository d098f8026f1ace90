//! Batch processing command for multiple receipt files.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use rcpt_core::{LineError, OcrTextExtractor, Receipt};

use super::output::{OutputArgs, emit};
use super::process::{IMAGE_EXTENSIONS, TEXT_EXTENSIONS, extract_from_path, ocr_config};
use super::{ReceiptArgs, build_receipt, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    receipt: ReceiptArgs,

    #[command(flatten)]
    output: OutputArgs,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            TEXT_EXTENSIONS.contains(&ext.as_str()) || IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut extractor = OcrTextExtractor::from_config(&config.extraction)?;
    if let Some(date) = args.receipt.date {
        extractor = extractor.with_date(date);
    }
    let ocr_config = ocr_config(&config, args.model_dir.as_deref());

    let mut receipts: Vec<Receipt> = Vec::new();
    let mut errors: Vec<LineError> = Vec::new();
    let mut failed: Vec<(PathBuf, String)> = Vec::new();

    for path in &files {
        match extract_from_path(path, &extractor, &ocr_config) {
            Ok((mut extraction, _)) => {
                if args.output.sort || config.extraction.sort_by_price {
                    extraction.sort_by_price_desc();
                }
                errors.extend(extraction.errors);

                match build_receipt(extraction.items, &args.receipt) {
                    Some(receipt) => receipts.push(receipt),
                    None => failed.push((path.clone(), "no line items found".to_string())),
                }
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    failed.push((path.clone(), error_msg));
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    emit(&receipts, &errors, &args.output, &config)?;

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        files.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} receipts, {} without items",
        style(receipts.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Skipped files:").red());
        for (path, reason) in &failed {
            eprintln!("  - {}: {}", path.display(), reason);
        }
    }

    Ok(())
}
