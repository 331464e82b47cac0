//! Listing entities produced by page extraction

use serde::Serialize;
use url::Url;

use crate::infrastructure::parsing::config::FieldKind;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Unvalidated (url, price text, rating text) triple taken from one listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCandidate {
    pub url: String,
    pub price_text: String,
    pub rating_text: String,
}

/// A parsed listing.
///
/// Price and rating are finite and non-negative and the URL is absolute.
/// Fields are private so a record cannot be altered once it has been
/// accumulated; serialization order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRecord {
    url: String,
    price: f64,
    rating: f64,
}

impl ListingRecord {
    pub fn new(url: impl Into<String>, price: f64, rating: f64) -> ParsingResult<Self> {
        let url = url.into();
        check_amount(FieldKind::Price, price)?;
        check_amount(FieldKind::Rating, rating)?;

        let parsed = Url::parse(&url)
            .map_err(|e| ParsingError::url_resolution_failed(&url, e, None))?;
        if !parsed.has_host() {
            return Err(ParsingError::url_resolution_failed(&url, "URL has no host", None));
        }

        Ok(Self { url, price, rating })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn price(&self) -> f64 {
        self.price
    }

    pub const fn rating(&self) -> f64 {
        self.rating
    }
}

fn check_amount(field: FieldKind, value: f64) -> ParsingResult<()> {
    if !value.is_finite() {
        return Err(ParsingError::invalid_number(field, &value.to_string(), "value is not finite"));
    }
    if value < 0.0 {
        return Err(ParsingError::invalid_number(field, &value.to_string(), "value is negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_absolute_url_and_valid_amounts() {
        let record = ListingRecord::new("https://www.playerauctions.com/offer/1", 12.5, 4.0).unwrap();
        assert_eq!(record.url(), "https://www.playerauctions.com/offer/1");
        assert!((record.price() - 12.5).abs() < f64::EPSILON);
        assert!((record.rating() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_relative_url() {
        assert!(matches!(
            ListingRecord::new("/offer/1", 1.0, 1.0),
            Err(ParsingError::UrlResolutionFailed { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_and_negative_values() {
        let url = "https://example.com/a";
        assert!(ListingRecord::new(url, f64::NAN, 1.0).is_err());
        assert!(ListingRecord::new(url, 1.0, f64::INFINITY).is_err());
        assert!(ListingRecord::new(url, -0.5, 1.0).is_err());
    }
}
