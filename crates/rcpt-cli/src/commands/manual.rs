//! Manual command - build a receipt from typed "name, price" lines.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use rcpt_core::{ItemExtractor, ManualEntryParser};

use super::output::{OutputArgs, emit, print_line_errors};
use super::{ReceiptArgs, build_receipt, load_config};

/// Arguments for the manual command.
#[derive(Args)]
pub struct ManualArgs {
    /// File with one "name, price" per line ("-" reads stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    #[command(flatten)]
    receipt: ReceiptArgs,

    #[command(flatten)]
    output: OutputArgs,
}

pub fn run(args: ManualArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        if !args.input.exists() {
            anyhow::bail!("Input file not found: {}", args.input.display());
        }
        std::fs::read_to_string(&args.input)?
    };

    let mut parser = ManualEntryParser::new();
    if let Some(date) = args.receipt.date {
        parser = parser.with_date(date);
    }

    let mut extraction = parser.extract(&text);
    info!(
        "Parsed {} items, {} rejected lines",
        extraction.items.len(),
        extraction.errors.len()
    );

    print_line_errors(&extraction.errors);
    if !extraction.errors.is_empty() {
        eprintln!(
            "{} {} line(s) skipped",
            style("ℹ").blue(),
            extraction.errors.len()
        );
    }

    if args.output.sort || config.extraction.sort_by_price {
        extraction.sort_by_price_desc();
    }

    let receipts: Vec<_> = build_receipt(extraction.items, &args.receipt).into_iter().collect();
    emit(&receipts, &extraction.errors, &args.output, &config)
}
