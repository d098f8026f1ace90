//! Manual "name, price" entry parsing.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::receipt::LineItem;

use super::{Extraction, ItemExtractor, LineError, LineErrorKind};

/// Parses typed `name, price` lines.
///
/// Each line is split on its first comma. Bad lines are reported and skipped;
/// they never abort the rest of the input.
#[derive(Debug, Clone, Default)]
pub struct ManualEntryParser {
    date: Option<NaiveDate>,
}

impl ManualEntryParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp every item with a fixed date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Parse one `name, price` line.
    pub fn parse_line(&self, line: &str) -> Result<LineItem, LineErrorKind> {
        let (name, price) = line
            .split_once(',')
            .ok_or(LineErrorKind::MissingSeparator)?;

        let price_text = price.trim();
        let price = Decimal::from_str(price_text.trim_start_matches('$'))
            .map_err(|_| LineErrorKind::InvalidPrice(price_text.to_string()))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(LineErrorKind::EmptyName);
        }

        if price <= Decimal::ZERO {
            return Err(LineErrorKind::NonPositivePrice(price));
        }

        let mut item = LineItem::new(name, price);
        item.date = self.date;
        Ok(item)
    }
}

impl ItemExtractor for ManualEntryParser {
    fn extract(&self, text: &str) -> Extraction {
        let mut extraction = Extraction::empty();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match self.parse_line(line) {
                Ok(item) => extraction.items.push(item),
                Err(kind) => {
                    let error = LineError {
                        line_number: index + 1,
                        line: line.to_string(),
                        kind,
                    };
                    warn!("{}", error);
                    extraction.errors.push(error);
                }
            }
        }

        debug!(
            "Manual entry yielded {} items and {} errors",
            extraction.items.len(),
            extraction.errors.len()
        );

        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_valid_line() {
        let result = ManualEntryParser::new().extract("Coffee, 3.50");

        assert_eq!(result.items, vec![LineItem::new("Coffee", dec("3.50"))]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_missing_comma() {
        let result = ManualEntryParser::new().extract("BadLine");

        assert!(result.items.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, LineErrorKind::MissingSeparator);
        assert_eq!(result.errors[0].line_number, 1);
    }

    #[test]
    fn test_bad_price() {
        let result = ManualEntryParser::new().extract("Tea, abc");

        assert!(result.items.is_empty());
        assert_eq!(
            result.errors,
            vec![LineError {
                line_number: 1,
                line: "Tea, abc".to_string(),
                kind: LineErrorKind::InvalidPrice("abc".to_string()),
            }]
        );
    }

    #[test]
    fn test_errors_do_not_stop_processing() {
        let text = "Coffee, 3.50\nBadLine\n\n  Bagel ,  2.25  \nTea, abc\n, 1.00\nRefund, -2.00\nJuice, $4.00\n";
        let result = ManualEntryParser::new().extract(text);

        let pairs: Vec<(&str, Decimal)> = result
            .items
            .iter()
            .map(|i| (i.name.as_str(), i.price))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Coffee", dec("3.50")),
                ("Bagel", dec("2.25")),
                ("Juice", dec("4.00")),
            ]
        );

        let kinds: Vec<(usize, &LineErrorKind)> =
            result.errors.iter().map(|e| (e.line_number, &e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (2, &LineErrorKind::MissingSeparator),
                (5, &LineErrorKind::InvalidPrice("abc".to_string())),
                (6, &LineErrorKind::EmptyName),
                (7, &LineErrorKind::NonPositivePrice(dec("-2.00"))),
            ]
        );
    }

    #[test]
    fn test_splits_on_first_comma_only() {
        let parser = ManualEntryParser::new();

        assert_eq!(
            parser.parse_line("Crackers, salted, 2.00"),
            Err(LineErrorKind::InvalidPrice("salted, 2.00".to_string()))
        );
    }

    #[test]
    fn test_date_stamp() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 24).unwrap();
        let item = ManualEntryParser::new()
            .with_date(date)
            .parse_line("Candles, 6.00")
            .unwrap();

        assert_eq!(item.date, Some(date));
    }
}
