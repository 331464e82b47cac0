//! Listing acceptance policy
//!
//! A record survives when it is cheaper than the price ceiling, rated at or
//! below the rating ceiling, and its URL mentions none of the blocked
//! keywords. All three checks run so a rejection log names every reason.

use std::fmt;

use tracing::info;

use super::listing::ListingRecord;

/// Why a record was turned away
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    PriceAtOrAboveLimit { price: f64, limit: f64 },
    RatingAboveLimit { rating: f64, limit: f64 },
    BlockedSubstring { substring: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceAtOrAboveLimit { price, limit } => write!(f, "price {price} >= {limit}"),
            Self::RatingAboveLimit { rating, limit } => write!(f, "rating {rating} > {limit}"),
            Self::BlockedSubstring { substring } => write!(f, "url contains '{substring}'"),
        }
    }
}

/// Price/rating ceilings plus a case-insensitive URL blocklist
#[derive(Debug, Clone)]
pub struct PolicyFilter {
    price_limit: f64,
    rating_limit: f64,
    blocked_substrings: Vec<String>,
}

impl PolicyFilter {
    pub fn new<I, S>(price_limit: f64, rating_limit: f64, blocked_substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            price_limit,
            rating_limit,
            blocked_substrings: blocked_substrings
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Every reason the record fails the policy; empty when it passes
    pub fn evaluate(&self, record: &ListingRecord) -> Vec<Rejection> {
        let mut reasons = Vec::new();

        if record.price() >= self.price_limit {
            reasons.push(Rejection::PriceAtOrAboveLimit {
                price: record.price(),
                limit: self.price_limit,
            });
        }
        if record.rating() > self.rating_limit {
            reasons.push(Rejection::RatingAboveLimit {
                rating: record.rating(),
                limit: self.rating_limit,
            });
        }

        let url = record.url().to_lowercase();
        if let Some(substring) = self.blocked_substrings.iter().find(|s| url.contains(s.as_str())) {
            reasons.push(Rejection::BlockedSubstring {
                substring: substring.clone(),
            });
        }

        reasons
    }

    pub fn accept(&self, record: &ListingRecord) -> bool {
        let reasons = self.evaluate(record);
        if reasons.is_empty() {
            info!(
                "Adding listing: URL={}, Price={}, Rating={}",
                record.url(),
                record.price(),
                record.rating()
            );
            return true;
        }

        let joined: Vec<String> = reasons.iter().map(ToString::to_string).collect();
        info!(
            "Skipping listing: URL={}, Price={}, Rating={} ({})",
            record.url(),
            record.price(),
            record.rating(),
            joined.join(", ")
        );
        false
    }

    /// Split records into (accepted, rejected count)
    pub fn partition(&self, records: Vec<ListingRecord>) -> (Vec<ListingRecord>, usize) {
        let total = records.len();
        let accepted: Vec<ListingRecord> = records.into_iter().filter(|r| self.accept(r)).collect();
        let rejected = total - accepted.len();
        (accepted, rejected)
    }

    pub const fn price_limit(&self) -> f64 {
        self.price_limit
    }

    pub const fn rating_limit(&self) -> f64 {
        self.rating_limit
    }

    pub fn blocked_substrings(&self) -> &[String] {
        &self.blocked_substrings
    }
}

/// One-shot form of [`PolicyFilter::accept`]
pub fn accept(
    record: &ListingRecord,
    price_limit: f64,
    rating_limit: f64,
    blocked_substrings: &[&str],
) -> bool {
    PolicyFilter::new(price_limit, rating_limit, blocked_substrings).accept(record)
}
