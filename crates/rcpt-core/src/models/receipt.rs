//! Receipt data models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TotalsError;
use crate::totals::{Totals, compute_totals};

/// A single purchased item on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item label as printed or typed.
    pub name: String,

    /// Unit price.
    pub price: Decimal,

    /// Quantity (default: 1).
    #[serde(default = "default_quantity")]
    pub quantity: Decimal,

    /// Tax amount attached to this item (default: 0).
    #[serde(default)]
    pub tax: Decimal,

    /// Date the item was bought, when it differs from the receipt date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// When the item was captured from a scanned receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<NaiveDateTime>,
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

impl LineItem {
    /// Create an item with quantity 1 and no tax.
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
            quantity: Decimal::ONE,
            tax: Decimal::ZERO,
            date: None,
            captured_at: None,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_tax(mut self, tax: Decimal) -> Self {
        self.tax = tax;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_captured_at(mut self, captured_at: NaiveDateTime) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    /// Whether the item survives into totals and export.
    ///
    /// Requires a non-blank name and strictly positive price and quantity.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.price > Decimal::ZERO && self.quantity > Decimal::ZERO
    }

    /// Quantity times unit price, `None` on overflow.
    pub fn line_total(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.price)
    }
}

/// How tax is determined for a receipt.
///
/// Exactly one mode applies to a receipt; it is chosen when the receipt is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum TaxMode {
    /// Externally supplied amount.
    Flat(Decimal),
    /// Percentage of the subtotal (e.g. 8.25 for 8.25%).
    Percentage(Decimal),
    /// Sum of the per-item tax fields.
    PerItem,
}

impl Default for TaxMode {
    fn default() -> Self {
        Self::Flat(Decimal::ZERO)
    }
}

impl TaxMode {
    /// Short label for display.
    pub fn display(&self) -> String {
        match self {
            TaxMode::Flat(amount) => format!("flat {:.2}", amount),
            TaxMode::Percentage(rate) => format!("{}%", rate.normalize()),
            TaxMode::PerItem => "per item".to_string(),
        }
    }
}

/// A receipt assembled from one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Store or company name (may be empty).
    pub company: String,

    /// Receipt date.
    pub date: NaiveDate,

    /// Purchased items in input order.
    pub items: Vec<LineItem>,

    /// Tax handling.
    pub tax_mode: TaxMode,

    /// Total typed by the user, exported instead of the computed total.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stated_total: Option<Decimal>,
}

impl Receipt {
    /// Create a receipt with no stated total.
    pub fn new(
        company: impl Into<String>,
        date: NaiveDate,
        items: Vec<LineItem>,
        tax_mode: TaxMode,
    ) -> Self {
        Self {
            company: company.into(),
            date,
            items,
            tax_mode,
            stated_total: None,
        }
    }

    pub fn with_stated_total(mut self, total: Decimal) -> Self {
        self.stated_total = Some(total);
        self
    }

    /// Items that satisfy [`LineItem::is_valid`].
    pub fn valid_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| item.is_valid())
    }

    /// Subtotal, tax and total over the valid items.
    pub fn totals(&self) -> Result<Totals, TotalsError> {
        compute_totals(&self.items, self.tax_mode)
    }

    /// The total written to the table: stated if given, computed otherwise.
    pub fn export_total(&self) -> Result<Decimal, TotalsError> {
        match self.stated_total {
            Some(total) => Ok(total),
            None => self.totals().map(|t| t.total),
        }
    }

    /// Check the receipt and return any issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.items.is_empty() {
            issues.push("No line items".to_string());
        }

        let invalid = self.items.iter().filter(|item| !item.is_valid()).count();
        if invalid > 0 {
            issues.push(format!("{} item(s) without a name or positive price", invalid));
        }

        match (self.totals(), self.stated_total) {
            (Err(e), _) => issues.push(format!("Cannot compute totals: {}", e)),
            (Ok(totals), Some(stated)) => {
                let differs = stated
                    .checked_sub(totals.total)
                    .is_none_or(|diff| diff.abs() > Decimal::new(1, 2));
                if differs {
                    issues.push(format!(
                        "Stated total ({:.2}) differs from computed total ({:.2})",
                        stated, totals.total
                    ));
                }
            }
            (Ok(_), None) => {}
        }

        issues
    }
}
