//! Line item extraction from receipt text.

mod manual;
mod ocr_text;
pub mod patterns;

pub use manual::ManualEntryParser;
pub use ocr_text::OcrTextExtractor;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::receipt::LineItem;

/// Trait for line item extractors.
pub trait ItemExtractor {
    /// Extract line items from a block of text, one candidate per line.
    fn extract(&self, text: &str) -> Extraction;
}

/// Result of running an extractor over a block of text.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    /// Items in input line order.
    pub items: Vec<LineItem>,
    /// Lines that were rejected with a diagnostic.
    pub errors: Vec<LineError>,
    /// Non-blank lines dropped silently (no price, filtered keyword, empty name).
    pub skipped: usize,
}

impl Extraction {
    /// An extraction that found nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sort items by descending price, keeping input order among equal prices.
    pub fn sort_by_price_desc(&mut self) {
        self.items.sort_by(|a, b| b.price.cmp(&a.price));
    }
}

/// A rejected input line.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("line {line_number}: {kind}")]
pub struct LineError {
    /// 1-based line number in the input.
    pub line_number: usize,
    /// The offending line as given.
    pub line: String,
    /// What was wrong with it.
    pub kind: LineErrorKind,
}

/// Why a manual-entry line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", content = "value", rename_all = "snake_case")]
pub enum LineErrorKind {
    /// No comma between name and price.
    #[error("invalid format, expected 'name, price'")]
    MissingSeparator,

    /// Price segment is not a number.
    #[error("invalid price format: '{0}'")]
    InvalidPrice(String),

    /// Name segment is blank.
    #[error("item name is empty")]
    EmptyName,

    /// Price is zero or negative.
    #[error("price must be greater than zero, got {0}")]
    NonPositivePrice(Decimal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sort_by_price_desc_is_stable() {
        let mut extraction = Extraction {
            items: vec![
                LineItem::new("A", Decimal::from_str("1.00").unwrap()),
                LineItem::new("B", Decimal::from_str("5.00").unwrap()),
                LineItem::new("C", Decimal::from_str("1.00").unwrap()),
            ],
            ..Default::default()
        };

        extraction.sort_by_price_desc();
        let names: Vec<&str> = extraction.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_line_error_display() {
        let err = LineError {
            line_number: 3,
            line: "Tea, abc".to_string(),
            kind: LineErrorKind::InvalidPrice("abc".to_string()),
        };
        assert_eq!(err.to_string(), "line 3: invalid price format: 'abc'");
    }
}
