//! Per-session receipt form.
//!
//! A [`ReceiptForm`] holds the rows a user is editing before the receipt is
//! saved. Each session owns its own form; nothing here is shared.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FormError, TotalsError};
use crate::models::receipt::{LineItem, Receipt, TaxMode};
use crate::totals::{Totals, compute_totals};

/// One editable item row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    pub name: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub tax: Decimal,
    pub date: Option<NaiveDate>,
}

impl Default for ItemRow {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: Decimal::ZERO,
            quantity: Decimal::ONE,
            tax: Decimal::ZERO,
            date: None,
        }
    }
}

impl From<LineItem> for ItemRow {
    fn from(item: LineItem) -> Self {
        Self {
            name: item.name,
            price: item.price,
            quantity: item.quantity,
            tax: item.tax,
            date: item.date,
        }
    }
}

impl ItemRow {
    fn to_line_item(&self) -> LineItem {
        LineItem {
            name: self.name.trim().to_string(),
            price: self.price,
            quantity: self.quantity,
            tax: self.tax,
            date: self.date,
            captured_at: None,
        }
    }
}

/// Mutable receipt builder scoped to a single session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptForm {
    company: String,
    date: NaiveDate,
    rows: Vec<ItemRow>,
    tax_mode: TaxMode,
    stated_total: Option<Decimal>,
}

impl ReceiptForm {
    /// Create an empty form for the given receipt date.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            company: String::new(),
            date,
            rows: Vec::new(),
            tax_mode: TaxMode::default(),
            stated_total: None,
        }
    }

    pub fn set_company(&mut self, company: impl Into<String>) {
        self.company = company.into();
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn set_tax_mode(&mut self, tax_mode: TaxMode) {
        self.tax_mode = tax_mode;
    }

    pub fn set_stated_total(&mut self, total: Option<Decimal>) {
        self.stated_total = total;
    }

    pub fn rows(&self) -> &[ItemRow] {
        &self.rows
    }

    /// Append a blank row and return its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(ItemRow::default());
        self.rows.len() - 1
    }

    /// Replace the row at `index`.
    pub fn update_row(&mut self, index: usize, row: ItemRow) -> Result<(), FormError> {
        let len = self.rows.len();
        let slot = self
            .rows
            .get_mut(index)
            .ok_or(FormError::RowOutOfRange { index, len })?;
        *slot = row;
        Ok(())
    }

    /// Append an already extracted item as a new row.
    pub fn push_item(&mut self, item: LineItem) {
        self.rows.push(item.into());
    }

    /// Append several extracted items in order.
    pub fn extend<I: IntoIterator<Item = LineItem>>(&mut self, items: I) {
        self.rows.extend(items.into_iter().map(ItemRow::from));
    }

    /// Rows with a name, a positive price and a positive quantity.
    pub fn valid_items(&self) -> Vec<LineItem> {
        self.rows
            .iter()
            .map(ItemRow::to_line_item)
            .filter(LineItem::is_valid)
            .collect()
    }

    /// Totals over the valid rows, as shown while editing.
    pub fn running_totals(&self) -> Result<Totals, TotalsError> {
        compute_totals(&self.valid_items(), self.tax_mode)
    }

    /// Turn the form into a receipt.
    ///
    /// Fails when no row is valid or when the valid rows cannot be totalled.
    pub fn submit(&self) -> Result<Receipt, FormError> {
        let items = self.valid_items();
        if items.is_empty() {
            return Err(FormError::NoValidItems);
        }
        compute_totals(&items, self.tax_mode)?;

        debug!(
            "Submitting receipt with {} of {} rows",
            items.len(),
            self.rows.len()
        );

        let receipt = Receipt::new(self.company.clone(), self.date, items, self.tax_mode);
        Ok(match self.stated_total {
            Some(total) => receipt.with_stated_total(total),
            None => receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    #[test]
    fn test_growing_rows() {
        let mut form = ReceiptForm::new(date());
        let first = form.add_row();
        let second = form.add_row();
        assert_eq!((first, second), (0, 1));

        form.update_row(
            1,
            ItemRow {
                name: " Pencils ".to_string(),
                price: dec("1.20"),
                ..Default::default()
            },
        )
        .unwrap();

        // The blank first row is ignored.
        let items = form.valid_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Pencils");
    }

    #[test]
    fn test_update_out_of_range() {
        let mut form = ReceiptForm::new(date());
        form.add_row();

        assert_eq!(
            form.update_row(3, ItemRow::default()),
            Err(FormError::RowOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_running_totals_percentage() {
        let mut form = ReceiptForm::new(date());
        form.set_tax_mode(TaxMode::Percentage(dec("5")));
        form.push_item(LineItem::new("Paper", dec("10.00")));
        form.push_item(LineItem::new("Ink", dec("30.00")));

        let totals = form.running_totals().unwrap();
        assert_eq!(totals.subtotal, dec("40.00"));
        assert_eq!(totals.tax, dec("2.00"));
        assert_eq!(totals.total, dec("42.00"));
    }

    #[test]
    fn test_submit_requires_valid_item() {
        let mut form = ReceiptForm::new(date());
        form.add_row();

        assert_eq!(form.submit().unwrap_err(), FormError::NoValidItems);
    }

    #[test]
    fn test_submit_rejects_untotallable_rows() {
        let huge = dec("50000000000000000000000000000");
        let mut form = ReceiptForm::new(date());
        form.push_item(LineItem::new("Yacht", huge));
        assert!(form.submit().is_ok());

        form.push_item(LineItem::new("Jet", huge));
        assert_eq!(form.running_totals(), Err(TotalsError::Overflow));
        assert_eq!(
            form.submit().unwrap_err(),
            FormError::Totals(TotalsError::Overflow)
        );
    }

    #[test]
    fn test_submit_builds_receipt() {
        let mut form = ReceiptForm::new(date());
        form.set_company("Stationers");
        form.set_stated_total(Some(dec("12.00")));
        form.extend(vec![
            LineItem::new("Pens", dec("4.00")),
            LineItem::new("Folder", dec("8.00")),
        ]);

        let receipt = form.submit().unwrap();
        assert_eq!(receipt.company, "Stationers");
        assert_eq!(receipt.date, date());
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.stated_total, Some(dec("12.00")));
    }
}
