//! Line item extraction from noisy OCR text.

use std::str::FromStr;

use chrono::{Local, NaiveDate, Timelike};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::receipt::LineItem;

use super::patterns::{DEFAULT_SKIP_KEYWORDS, PRICE_PATTERN, SEPARATOR_RUNS};
use super::{Extraction, ItemExtractor};

/// Extracts `(name, price)` pairs from OCR output, one line at a time.
///
/// The rightmost price on a line is the item price; everything before it is
/// the item name, with any earlier prices and separator runs removed.
#[derive(Debug, Clone)]
pub struct OcrTextExtractor {
    /// Lowercased exclusion keywords.
    skip_keywords: Vec<String>,
    price_pattern: Regex,
    separator_pattern: Regex,
    stamp_capture_time: bool,
    date: Option<NaiveDate>,
}

impl OcrTextExtractor {
    /// Create an extractor with the default keywords and patterns.
    pub fn new() -> Self {
        Self {
            skip_keywords: DEFAULT_SKIP_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            price_pattern: PRICE_PATTERN.clone(),
            separator_pattern: SEPARATOR_RUNS.clone(),
            stamp_capture_time: false,
            date: None,
        }
    }

    /// Build an extractor from configuration, compiling its patterns.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let price_pattern = Regex::new(&config.price_pattern)
            .map_err(|source| ExtractionError::Pattern { name: "price", source })?;
        let separator_pattern = Regex::new(&config.separator_pattern)
            .map_err(|source| ExtractionError::Pattern { name: "separator", source })?;

        Ok(Self::new()
            .with_skip_keywords(config.skip_keywords.iter().cloned())
            .with_patterns(price_pattern, separator_pattern)
            .with_capture_stamp(config.stamp_capture_time))
    }

    /// Replace the exclusion keywords.
    pub fn with_skip_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_keywords = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    /// Replace the price and separator patterns.
    pub fn with_patterns(mut self, price: Regex, separator: Regex) -> Self {
        self.price_pattern = price;
        self.separator_pattern = separator;
        self
    }

    /// Stamp every item with the time of extraction.
    pub fn with_capture_stamp(mut self, stamp: bool) -> Self {
        self.stamp_capture_time = stamp;
        self
    }

    /// Stamp every item with a fixed date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Whether a line mentions one of the exclusion keywords.
    pub fn is_excluded(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.skip_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Parse a single line, ignoring the keyword filter.
    ///
    /// Returns `None` when the line has no price, the cleaned name is empty,
    /// or the price is not positive.
    pub fn parse_line(&self, line: &str) -> Option<LineItem> {
        let matches: Vec<regex::Match<'_>> = self.price_pattern.find_iter(line).collect();
        let (last, earlier) = matches.split_last()?;

        let mut name = line[..last.start()].trim().to_string();
        for other in earlier {
            name = name.replace(other.as_str(), "").trim().to_string();
        }
        let name = self.separator_pattern.replace_all(&name, " ").trim().to_string();

        if name.is_empty() {
            return None;
        }

        let price = parse_price(last.as_str())?;
        if price <= Decimal::ZERO {
            return None;
        }

        Some(LineItem::new(name, price))
    }
}

impl Default for OcrTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemExtractor for OcrTextExtractor {
    fn extract(&self, text: &str) -> Extraction {
        let mut extraction = Extraction::empty();
        let captured_at = self
            .stamp_capture_time
            .then(|| Local::now().naive_local().with_nanosecond(0))
            .flatten();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if self.is_excluded(line) {
                trace!("Skipping keyword line: {}", line.trim());
                extraction.skipped += 1;
                continue;
            }

            match self.parse_line(line) {
                Some(mut item) => {
                    item.date = self.date;
                    if let Some(at) = captured_at {
                        item = item.with_captured_at(at);
                    }
                    extraction.items.push(item);
                }
                None => {
                    trace!("No item on line: {}", line.trim());
                    extraction.skipped += 1;
                }
            }
        }

        debug!(
            "OCR text yielded {} items ({} lines skipped)",
            extraction.items.len(),
            extraction.skipped
        );

        extraction
    }
}

/// Parse a matched price, dropping currency symbols.
fn parse_price(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    Decimal::from_str(&cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_dot_leaders_and_total_line() {
        let extractor = OcrTextExtractor::new();
        let result = extractor.extract("Milk .......... $4.99\nTOTAL $4.99\n");

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Milk");
        assert_eq!(result.items[0].price, dec("4.99"));
        assert_eq!(result.skipped, 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_rightmost_price_wins() {
        let extractor = OcrTextExtractor::new();
        let item = extractor.parse_line("Widget 2 @ 1.50 3.00").unwrap();

        assert_eq!(item.name, "Widget 2");
        assert_eq!(item.price, dec("3.00"));
    }

    #[test]
    fn test_keyword_filter_is_case_insensitive() {
        let extractor = OcrTextExtractor::new();
        let text = "Subtotal 9.00\nSales Tax 0.72\nVISA CREDIT 9.72\nChange 0.28\nCall our Phone 555.12\nBananas 1.29\n";
        let result = extractor.extract(text);

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Bananas");
        assert_eq!(result.skipped, 5);
    }

    #[test]
    fn test_lines_without_price_or_name_are_skipped() {
        let extractor = OcrTextExtractor::new();
        let text = "CORNER STORE\n\n   \n$2.50\nThank you 4\nApples\t2.00\n";
        let result = extractor.extract(text);

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Apples");
        assert_eq!(result.skipped, 3);
    }

    #[test]
    fn test_order_preserved() {
        let extractor = OcrTextExtractor::new();
        let result = extractor.extract("Eggs 3.10\nBread 2.25\nJam 4.75\n");

        let names: Vec<&str> = result.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Eggs", "Bread", "Jam"]);
    }

    #[test]
    fn test_zero_price_is_dropped() {
        let extractor = OcrTextExtractor::new();
        let result = extractor.extract("Free bag 0.00\n");

        assert!(result.is_empty());
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_stamps() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let extractor = OcrTextExtractor::new().with_capture_stamp(true).with_date(date);
        let result = extractor.extract("Soap 1.99\n");

        assert_eq!(result.items[0].date, Some(date));
        assert!(result.items[0].captured_at.is_some());

        let plain = OcrTextExtractor::new().extract("Soap 1.99\n");
        assert_eq!(plain.items[0].captured_at, None);
    }

    #[test]
    fn test_from_config_keywords() {
        let mut config = ExtractionConfig::default();
        config.skip_keywords = vec!["VISA".to_string()];
        let extractor = OcrTextExtractor::from_config(&config).unwrap();

        let result = extractor.extract("visa 12.00\nTotal 12.00\n");
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Total");
    }

    #[test]
    fn test_from_config_rejects_bad_pattern() {
        let mut config = ExtractionConfig::default();
        config.price_pattern = "(".to_string();

        let err = OcrTextExtractor::from_config(&config).unwrap_err();
        assert!(err.to_string().starts_with("invalid price pattern"));
    }
}
