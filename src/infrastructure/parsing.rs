//! HTML parsing infrastructure for listing pages
//!
//! Selector table, fallback locator, numeric parsing, record extraction and
//! the page-level parser that ties them together.

pub mod config;
pub mod context;
pub mod error;
pub mod field_locator;
pub mod listing_page_parser;
pub mod numeric;
pub mod record_extractor;

// Re-export public types
pub use config::{FieldKind, ParsingConfig, SelectorTable};
pub use context::ParseContext;
pub use error::{ParsingError, ParsingResult};
pub use field_locator::{FieldLocator, LocatedField, locate};
pub use listing_page_parser::{ListingPageParser, PageExtraction, PageParser, PairingStrategy};
pub use numeric::{parse_price, parse_rating};
pub use record_extractor::{Extraction, RecordExtractor};
