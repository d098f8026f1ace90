//! Output options and writers shared by the receipt commands.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use serde::Serialize;

use rcpt_core::export::{ReceiptTable, TableRow, file_name};
use rcpt_core::models::config::RcptConfig;
use rcpt_core::error::TotalsError;
use rcpt_core::{LineError, Receipt, Totals};

/// Where and how to write the result.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output file ("-" for stdout; default for CSV: <output-dir>/receipt_<YYYYMMDD>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for the dated CSV file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Previously exported CSV to append the new rows to
    #[arg(long)]
    pub merge: Option<PathBuf>,

    /// Append SUBTOTAL, TAX and TOTAL rows
    #[arg(long)]
    pub trailers: bool,

    /// Sort items by descending price
    #[arg(long)]
    pub sort: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV spreadsheet
    Csv,
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

enum Destination {
    Stdout,
    File(PathBuf),
}

#[derive(Serialize)]
struct Report<'a> {
    receipts: Vec<ReceiptReport<'a>>,
    rows: &'a [TableRow],
    errors: &'a [LineError],
}

#[derive(Serialize)]
struct ReceiptReport<'a> {
    #[serde(flatten)]
    receipt: &'a Receipt,
    totals: Totals,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<String>,
}

/// Report line errors on stderr.
pub fn print_line_errors(errors: &[LineError]) {
    for error in errors {
        eprintln!("{} {}", style("⚠").yellow(), error);
    }
}

/// Tabulate receipts and write them in the requested format.
///
/// An empty table prints a warning and writes nothing.
pub fn emit(
    receipts: &[Receipt],
    errors: &[LineError],
    args: &OutputArgs,
    config: &RcptConfig,
) -> anyhow::Result<()> {
    let include_trailers = args.trailers || config.export.include_trailers;

    let mut table = ReceiptTable::new();
    for receipt in receipts {
        for issue in receipt.validate() {
            eprintln!("{} {}", style("⚠").yellow(), issue);
        }
        table.append(ReceiptTable::from_receipt(receipt, include_trailers)?);
    }

    let Some(first) = receipts.first().filter(|_| !table.is_empty()) else {
        eprintln!("{} No data available for download.", style("⚠").yellow());
        return Ok(());
    };

    if let Some(prior_path) = &args.merge {
        let prior = ReceiptTable::from_path(prior_path)
            .with_context(|| format!("Failed to read {}", prior_path.display()))?;
        eprintln!(
            "{} Merging {} new rows after {} existing rows",
            style("ℹ").blue(),
            table.len(),
            prior.len()
        );
        table = ReceiptTable::merge(prior, table);
    }

    let (content, destination) = match args.format {
        OutputFormat::Csv => {
            let destination = match &args.output {
                Some(path) if path.as_os_str() == "-" => Destination::Stdout,
                Some(path) => Destination::File(path.clone()),
                None => {
                    let dir = args
                        .output_dir
                        .clone()
                        .unwrap_or_else(|| config.export.output_dir.clone());
                    fs::create_dir_all(&dir)?;
                    Destination::File(dir.join(file_name(&config.export.file_prefix, first.date)))
                }
            };
            (table.to_csv_bytes()?, destination)
        }
        OutputFormat::Json => {
            let mut reports = Vec::with_capacity(receipts.len());
            for receipt in receipts {
                reports.push(ReceiptReport {
                    receipt,
                    totals: receipt.totals()?,
                    issues: receipt.validate(),
                });
            }
            let report = Report {
                receipts: reports,
                rows: table.rows(),
                errors,
            };
            let json = serde_json::to_string_pretty(&report)?;
            (json.into_bytes(), stream_destination(args))
        }
        OutputFormat::Text => (format_text(receipts)?.into_bytes(), stream_destination(args)),
    };

    match destination {
        Destination::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&content)?;
            stdout.flush()?;
        }
        Destination::File(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
    }

    Ok(())
}

fn stream_destination(args: &OutputArgs) -> Destination {
    match &args.output {
        Some(path) if path.as_os_str() != "-" => Destination::File(path.clone()),
        _ => Destination::Stdout,
    }
}

fn format_text(receipts: &[Receipt]) -> Result<String, TotalsError> {
    let mut output = String::new();

    for receipt in receipts {
        let totals = receipt.totals()?;
        let items: Vec<_> = receipt.valid_items().collect();

        if !receipt.company.is_empty() {
            output.push_str(&format!("Company: {}\n", receipt.company));
        }
        output.push_str(&format!("Date: {}\n", receipt.date));
        output.push('\n');

        output.push_str("Items:\n");
        for item in &items {
            let label = if item.quantity == rust_decimal::Decimal::ONE {
                item.name.clone()
            } else {
                format!("{} x{}", item.name, item.quantity.normalize())
            };
            let price = format!("{:.2}", item.price);
            output.push_str(&format!("  {:<32} {:>10}\n", label, price));
        }
        output.push('\n');

        output.push_str(&format!("Total Items: {}\n", items.len()));
        output.push_str(&format!("Subtotal: ${:.2}\n", totals.subtotal));
        output.push_str(&format!(
            "Tax Amount: ${:.2} ({})\n",
            totals.tax,
            receipt.tax_mode.display()
        ));
        output.push_str(&format!("Total: ${:.2}\n", receipt.export_total()?));
        output.push('\n');
    }

    Ok(output)
}
