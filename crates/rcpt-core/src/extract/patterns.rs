//! Default patterns and keywords for receipt line scanning.

use lazy_static::lazy_static;
use regex::Regex;

/// Optional dollar sign, digits, a decimal point and exactly two digits.
pub const DEFAULT_PRICE_PATTERN: &str = r"\$?\d+\.\d{2}";

/// Dot leaders, `@` signs and tabs left between an item name and its price.
pub const DEFAULT_SEPARATOR_PATTERN: &str = r"[.]{2,}|[@\t]+";

/// Lines containing any of these words are receipt furniture, not items.
pub const DEFAULT_SKIP_KEYWORDS: [&str; 8] = [
    "total", "subtotal", "tax", "change", "cash", "credit", "phone", "receipt",
];

lazy_static! {
    pub static ref PRICE_PATTERN: Regex = Regex::new(DEFAULT_PRICE_PATTERN).unwrap();

    pub static ref SEPARATOR_RUNS: Regex = Regex::new(DEFAULT_SEPARATOR_PATTERN).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_pattern() {
        let found: Vec<&str> = PRICE_PATTERN
            .find_iter("2 @ 1.50 $3.00 12 4.5")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["1.50", "$3.00"]);
    }

    #[test]
    fn test_separator_runs() {
        assert_eq!(SEPARATOR_RUNS.replace_all("Milk ......", " "), "Milk  ");
        assert_eq!(SEPARATOR_RUNS.replace_all("Eggs\t\t@", " "), "Eggs ");
        // A single dot is part of the name.
        assert_eq!(SEPARATOR_RUNS.replace_all("St. Bread", " "), "St. Bread");
    }
}
