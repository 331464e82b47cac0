//! Auction Scout - Paginated listing crawler
//!
//! Walks the PlayerAuctions OSRS account listings page by page, extracts
//! (url, price, rating) triples with selector fallbacks, keeps the ones that
//! pass the price/rating/blocklist policy and exports them as CSV.

// Module declarations
pub mod crawling;
pub mod domain;
pub mod infrastructure;

pub use crawling::{CrawlDriver, CrawlReport};
pub use domain::{ListingRecord, PolicyFilter};
