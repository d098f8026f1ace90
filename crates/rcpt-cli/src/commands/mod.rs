//! Subcommands and the options they share.

pub mod batch;
pub mod config;
pub mod manual;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use rust_decimal::Decimal;
use tracing::debug;

use rcpt_core::models::config::RcptConfig;
use rcpt_core::{LineItem, Receipt, ReceiptForm, TaxMode};

/// Receipt-level fields.
#[derive(Args, Debug, Clone)]
pub struct ReceiptArgs {
    /// Company or store name
    #[arg(long, default_value = "")]
    pub company: String,

    /// Receipt date as YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[command(flatten)]
    pub tax: TaxArgs,

    /// Total printed on the receipt, exported instead of the computed total
    #[arg(long)]
    pub total: Option<Decimal>,
}

impl ReceiptArgs {
    pub fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Tax handling; at most one may be given.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct TaxArgs {
    /// Flat tax amount
    #[arg(long)]
    pub tax: Option<Decimal>,

    /// Tax rate as a percentage of the subtotal
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Sum the per-item tax amounts
    #[arg(long)]
    pub per_item_tax: bool,
}

impl TaxArgs {
    pub fn mode(&self) -> TaxMode {
        match (self.tax, self.tax_rate, self.per_item_tax) {
            (_, _, true) => TaxMode::PerItem,
            (_, Some(rate), _) => TaxMode::Percentage(rate),
            (Some(amount), _, _) => TaxMode::Flat(amount),
            (None, None, false) => TaxMode::default(),
        }
    }
}

/// Build a receipt from extracted items through a session-scoped form.
///
/// Prints a warning and returns `None` when no item is valid.
pub fn build_receipt(items: Vec<LineItem>, args: &ReceiptArgs) -> Option<Receipt> {
    let mut form = ReceiptForm::new(args.date());
    form.set_company(args.company.clone());
    form.set_tax_mode(args.tax.mode());
    form.set_stated_total(args.total);
    form.extend(items);

    if let Ok(totals) = form.running_totals() {
        debug!(
            "Running totals: subtotal {:.2}, tax {:.2}, total {:.2}",
            totals.subtotal, totals.tax, totals.total
        );
    }

    match form.submit() {
        Ok(receipt) => Some(receipt),
        Err(e) => {
            eprintln!("{} {}", style("⚠").yellow(), e);
            None
        }
    }
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Load the configuration from an explicit path, the default path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    if let Some(path) = config_path {
        return Ok(RcptConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(RcptConfig::from_file(&default_path)?)
    } else {
        Ok(RcptConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tax_mode_selection() {
        let rate = Decimal::from_str("8.5").unwrap();

        assert_eq!(TaxArgs::default().mode(), TaxMode::Flat(Decimal::ZERO));
        assert_eq!(
            TaxArgs { tax_rate: Some(rate), ..Default::default() }.mode(),
            TaxMode::Percentage(rate)
        );
        assert_eq!(
            TaxArgs { per_item_tax: true, ..Default::default() }.mode(),
            TaxMode::PerItem
        );
    }
}
