//! Listing page parser
//!
//! Runs locator and extractor over one fetched page. Container pairing is
//! tried first because it keeps each price next to its own rating; when the
//! page has no usable containers the parser falls back to pairing the two
//! located lists by position.

use scraper::Html;
use tracing::{debug, warn};

use super::config::{FieldKind, ParsingConfig};
use super::context::ParseContext;
use super::error::ParsingResult;
use super::field_locator::{FieldLocator, class_inventory};
use super::record_extractor::{Extraction, RecordExtractor};
use crate::domain::ListingRecord;

/// How the pairs on a page were formed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStrategy {
    Container,
    Positional,
    /// Price or rating could not be located at all
    Unlocated,
}

/// Everything learned from one page
#[derive(Debug, Clone)]
pub struct PageExtraction {
    pub page_index: u32,
    pub strategy: PairingStrategy,
    pub container_selector: Option<String>,
    pub price_selector: Option<String>,
    pub rating_selector: Option<String>,
    pub paired_count: usize,
    pub skipped_count: usize,
    pub records: Vec<ListingRecord>,
}

impl PageExtraction {
    /// Whether the page had any candidate pairs at all, parsable or not
    pub const fn has_candidates(&self) -> bool {
        self.paired_count > 0
    }

    fn unlocated(page_index: u32) -> Self {
        Self {
            page_index,
            strategy: PairingStrategy::Unlocated,
            container_selector: None,
            price_selector: None,
            rating_selector: None,
            paired_count: 0,
            skipped_count: 0,
            records: Vec::new(),
        }
    }
}

/// Turns a page body into candidate records
pub trait PageParser: Send + Sync {
    fn parse_page(&self, html: &str, context: &ParseContext) -> PageExtraction;
}

pub struct ListingPageParser {
    locator: FieldLocator,
    extractor: RecordExtractor,
}

impl ListingPageParser {
    pub fn new(config: &ParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            locator: FieldLocator::new(&config.selectors)?,
            extractor: RecordExtractor::new(&config.base_url, config.max_anchor_depth)?,
        })
    }

    fn finish(page_index: u32, strategy: PairingStrategy, extraction: Extraction) -> PageExtraction {
        PageExtraction {
            page_index,
            strategy,
            container_selector: None,
            price_selector: None,
            rating_selector: None,
            paired_count: extraction.paired_count,
            skipped_count: extraction.skipped.len(),
            records: extraction.records,
        }
    }
}

impl PageParser for ListingPageParser {
    fn parse_page(&self, html: &str, context: &ParseContext) -> PageExtraction {
        let document = Html::parse_document(html);
        let page_index = context.page_index;

        let containers = self.locator.locate(&document, FieldKind::Container);
        if !containers.is_empty() {
            let extraction = self
                .extractor
                .extract_from_containers(&containers.elements, &self.locator);
            if extraction.paired_count > 0 {
                debug!(
                    "Page {}: paired {} listings via '{}' containers",
                    page_index,
                    extraction.paired_count,
                    containers.selector.as_deref().unwrap_or_default()
                );
                let mut page = Self::finish(page_index, PairingStrategy::Container, extraction);
                page.container_selector = containers.selector;
                return page;
            }
            debug!(
                "Page {}: {} containers held no complete listing, pairing positionally",
                page_index,
                containers.len()
            );
        }

        let prices = self.locator.locate(&document, FieldKind::Price);
        let ratings = self.locator.locate(&document, FieldKind::Rating);

        if prices.is_empty() || ratings.is_empty() {
            warn!(
                "Could not find price results ({}) or rating results ({}) on page {} ({})",
                prices.len(),
                ratings.len(),
                page_index,
                context.source_url
            );
            debug!("Available classes in HTML: {:?}", class_inventory(&document));
            return PageExtraction::unlocated(page_index);
        }

        let extraction = self.extractor.extract(&prices.elements, &ratings.elements);
        let mut page = Self::finish(page_index, PairingStrategy::Positional, extraction);
        page.price_selector = prices.selector;
        page.rating_selector = ratings.selector;
        page
    }
}
