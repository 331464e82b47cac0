//! Numeric field parsing
//!
//! Listing text is noisy ("$1,234.50 USD", "4.9 / 5"), so values are pulled
//! out with a pattern search rather than a whole-string parse.

use once_cell::sync::Lazy;
use regex::Regex;

use super::config::FieldKind;
use super::error::{ParsingError, ParsingResult};

/// Optional currency symbol, then digits with thousands separators and at most one decimal point
static PRICE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[$€£]?\s*(\d[\d,]*(?:\.\d+)?|\.\d+)").expect("price pattern is a valid regex")
});

/// Digits with at most one decimal point
static RATING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?|\.\d+)").expect("rating pattern is a valid regex"));

/// Parse a price such as `$1,234.50` into `1234.5`
pub fn parse_price(text: &str) -> ParsingResult<f64> {
    let digits = capture(&PRICE_PATTERN, FieldKind::Price, text)?;
    to_number(FieldKind::Price, text, &digits.replace(',', ""))
}

/// Parse a rating such as `4.8` or `4.8 / 5` into `4.8`
pub fn parse_rating(text: &str) -> ParsingResult<f64> {
    let digits = capture(&RATING_PATTERN, FieldKind::Rating, text)?;
    to_number(FieldKind::Rating, text, digits)
}

fn capture<'t>(pattern: &Regex, field: FieldKind, text: &'t str) -> ParsingResult<&'t str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParsingError::EmptyFieldText { field });
    }

    pattern
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ParsingError::pattern_mismatch(field, trimmed))
}

fn to_number(field: FieldKind, text: &str, digits: &str) -> ParsingResult<f64> {
    let value: f64 = digits
        .parse()
        .map_err(|e| ParsingError::invalid_number(field, text, e))?;

    if !value.is_finite() {
        return Err(ParsingError::invalid_number(field, text, "value is not finite"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("$1,234.50", 1234.50)]
    #[case("1234", 1234.0)]
    #[case("  $19.99  ", 19.99)]
    #[case("Price: $2,500", 2500.0)]
    #[case("€.99", 0.99)]
    #[case("$1,000,000.00 USD", 1_000_000.0)]
    fn parses_prices(#[case] text: &str, #[case] expected: f64) {
        let value = parse_price(text).unwrap();
        assert!((value - expected).abs() < f64::EPSILON, "{text} -> {value}");
    }

    #[rstest]
    #[case("4.8", 4.8)]
    #[case("5", 5.0)]
    #[case("4.9 / 5", 4.9)]
    #[case("Rating 3.25", 3.25)]
    fn parses_ratings(#[case] text: &str, #[case] expected: f64) {
        let value = parse_rating(text).unwrap();
        assert!((value - expected).abs() < f64::EPSILON, "{text} -> {value}");
    }

    #[test]
    fn non_numeric_price_is_a_pattern_mismatch() {
        assert_eq!(
            parse_price("abc"),
            Err(ParsingError::pattern_mismatch(FieldKind::Price, "abc"))
        );
    }

    #[test]
    fn blank_text_is_reported_as_empty() {
        assert_eq!(
            parse_rating("   "),
            Err(ParsingError::EmptyFieldText {
                field: FieldKind::Rating
            })
        );
    }

    #[test]
    fn only_one_decimal_point_is_taken() {
        assert!((parse_rating("1.2.3").unwrap() - 1.2).abs() < f64::EPSILON);
    }
}
