//! Subtotal, tax and total arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TotalsError;
use crate::models::receipt::{LineItem, TaxMode};

/// Computed receipt totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of quantity times price over valid items.
    pub subtotal: Decimal,
    /// Tax under the receipt's tax mode.
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
}

impl Totals {
    /// Tax divided evenly across `count` items (not proportionally to price).
    pub fn tax_share(&self, count: usize) -> Decimal {
        if count == 0 {
            return Decimal::ZERO;
        }
        self.tax / Decimal::from(count)
    }
}

/// Compute totals over the items that are valid line items.
///
/// Items with a blank name, a non-positive price, or a non-positive quantity
/// contribute nothing, including their per-item tax. Amounts beyond the
/// decimal range yield [`TotalsError::Overflow`].
pub fn compute_totals(items: &[LineItem], tax_mode: TaxMode) -> Result<Totals, TotalsError> {
    let valid = || items.iter().filter(|item| item.is_valid());

    let subtotal = checked_sum(valid().map(LineItem::line_total))?;

    let tax = match tax_mode {
        TaxMode::Flat(amount) => amount,
        TaxMode::Percentage(rate) => subtotal
            .checked_mul(rate)
            .and_then(|t| t.checked_div(Decimal::ONE_HUNDRED))
            .ok_or(TotalsError::Overflow)?,
        TaxMode::PerItem => checked_sum(valid().map(|item| Some(item.tax)))?,
    };

    let total = subtotal.checked_add(tax).ok_or(TotalsError::Overflow)?;

    Ok(Totals { subtotal, tax, total })
}

fn checked_sum<I>(amounts: I) -> Result<Decimal, TotalsError>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        amount
            .and_then(|a| acc.checked_add(a))
            .ok_or(TotalsError::Overflow)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn basket() -> Vec<LineItem> {
        vec![
            LineItem::new("Widget", dec("1.50")).with_quantity(dec("2")),
            LineItem::new("Gadget", dec("3.00")),
        ]
    }

    #[test]
    fn test_flat_tax() {
        let totals = compute_totals(&basket(), TaxMode::Flat(dec("0.50"))).unwrap();

        assert_eq!(totals.subtotal, dec("6.00"));
        assert_eq!(totals.tax, dec("0.50"));
        assert_eq!(totals.total, dec("6.50"));
    }

    #[test]
    fn test_percentage_tax() {
        let totals = compute_totals(&basket(), TaxMode::Percentage(dec("10"))).unwrap();

        assert_eq!(totals.tax, dec("0.60"));
        assert_eq!(totals.total, dec("6.60"));
    }

    #[test]
    fn test_per_item_tax_ignores_invalid_items() {
        let items = vec![
            LineItem::new("Soap", dec("2.00")).with_tax(dec("0.16")),
            LineItem::new("Shampoo", dec("5.00")).with_tax(dec("0.40")),
            LineItem::new("", dec("9.00")).with_tax(dec("0.72")),
            LineItem::new("Voided", Decimal::ZERO).with_tax(dec("1.00")),
        ];
        let totals = compute_totals(&items, TaxMode::PerItem).unwrap();

        assert_eq!(totals.subtotal, dec("7.00"));
        assert_eq!(totals.tax, dec("0.56"));
        assert_eq!(totals.total, dec("7.56"));
    }

    #[test]
    fn test_tax_share_is_even() {
        let totals = compute_totals(&basket(), TaxMode::Flat(dec("0.50"))).unwrap();

        assert_eq!(totals.tax_share(2), dec("0.25"));
        assert_eq!(totals.tax_share(0), Decimal::ZERO);
    }

    #[test]
    fn test_empty_items() {
        let totals = compute_totals(&[], TaxMode::Percentage(dec("8"))).unwrap();
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = dec("50000000000000000000000000000");
        let items = vec![LineItem::new("Yacht", huge), LineItem::new("Jet", huge)];

        assert_eq!(
            compute_totals(&items, TaxMode::default()),
            Err(TotalsError::Overflow)
        );
    }

    #[test]
    fn test_overflow_in_quantity_and_rate() {
        let items = vec![LineItem::new("Bolts", dec("40000000000000000000000000000")).with_quantity(dec("2"))];
        assert_eq!(compute_totals(&items, TaxMode::PerItem), Err(TotalsError::Overflow));

        let items = vec![LineItem::new("Nuts", dec("1000000000000000000000000000"))];
        assert_eq!(
            compute_totals(&items, TaxMode::Percentage(dec("10000"))),
            Err(TotalsError::Overflow)
        );
    }
}
