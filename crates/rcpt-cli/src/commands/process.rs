//! Process command - extract line items from a receipt image or OCR text.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rcpt_core::models::config::{OcrConfig, RcptConfig};
use rcpt_core::ocr::{OcrEngine, ScanOutcome, scan_image};
use rcpt_core::{Extraction, ItemExtractor, OcrTextExtractor, PureOcrEngine};

use super::output::{OutputArgs, emit, print_line_errors};
use super::{ReceiptArgs, build_receipt, load_config};

/// File extensions treated as images.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// File extensions treated as already recognized text.
pub const TEXT_EXTENSIONS: [&str; 2] = ["txt", "text"];

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (receipt image, or a .txt file of OCR output)
    #[arg(required = true)]
    input: PathBuf,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Print the recognized text
    #[arg(long)]
    show_text: bool,

    #[command(flatten)]
    receipt: ReceiptArgs,

    #[command(flatten)]
    output: OutputArgs,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let mut extractor = OcrTextExtractor::from_config(&config.extraction)?;
    if let Some(date) = args.receipt.date {
        extractor = extractor.with_date(date);
    }

    let ocr_config = ocr_config(&config, args.model_dir.as_deref());
    let (mut extraction, raw_text) = extract_from_path(&args.input, &extractor, &ocr_config)?;

    if args.show_text {
        eprintln!("{}", style("Extracted text:").bold());
        eprintln!("{}", raw_text);
    }

    print_line_errors(&extraction.errors);

    if args.output.sort || config.extraction.sort_by_price {
        extraction.sort_by_price_desc();
    }

    eprintln!(
        "{} Extracted {} items ({} lines skipped)",
        style("ℹ").blue(),
        extraction.items.len(),
        extraction.skipped
    );

    let receipts: Vec<_> = build_receipt(extraction.items, &args.receipt).into_iter().collect();
    emit(&receipts, &extraction.errors, &args.output, &config)?;

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// OCR settings with an optional model directory override.
pub fn ocr_config(config: &RcptConfig, model_dir: Option<&Path>) -> OcrConfig {
    let mut ocr = config.ocr.clone();
    if let Some(dir) = model_dir {
        ocr.model_dir = dir.to_path_buf();
    }
    ocr
}

/// Extract line items from one input file.
///
/// Text files are parsed directly; images go through OCR first. OCR problems
/// are reported and produce an empty extraction rather than an error.
/// Returns the extraction and the text it was run on.
pub fn extract_from_path(
    path: &Path,
    extractor: &OcrTextExtractor,
    ocr_config: &OcrConfig,
) -> anyhow::Result<(Extraction, String)> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        let text = fs::read_to_string(path)?;
        return Ok((extractor.extract(&text), text));
    }

    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    let image = image::open(path)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Loading OCR models...");

    let outcome = match PureOcrEngine::from_config(ocr_config.clone()) {
        Ok(engine) => {
            pb.set_message("Processing receipt...");
            scan_image(Some(&engine as &dyn OcrEngine), &image, extractor)
        }
        Err(e) => ScanOutcome {
            error: Some(format!(
                "{}\n\nPlace det/rec models in {} or pass --model-dir.",
                e,
                ocr_config.model_dir.display()
            )),
            ..Default::default()
        },
    };

    pb.finish_and_clear();

    if let Some(error) = &outcome.error {
        eprintln!("{} {}", style("✗").red(), error);
    } else {
        debug!("OCR finished in {}ms", outcome.processing_time_ms);
    }

    Ok((outcome.extraction, outcome.raw_text))
}
