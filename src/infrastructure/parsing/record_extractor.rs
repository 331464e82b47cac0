//! Record extractor
//!
//! Turns located price/rating elements into listing records. A bad pair
//! (empty text, unparsable number, missing link) is logged and dropped; the
//! rest of the page keeps going.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use tracing::{debug, error, warn};
use url::Url;

use super::config::FieldKind;
use super::error::{ParsingError, ParsingResult};
use super::field_locator::FieldLocator;
use super::numeric::{parse_price, parse_rating};
use crate::domain::{ListingCandidate, ListingRecord};

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Records pulled from one page, before policy filtering
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<ListingRecord>,
    /// Number of (price, rating) pairs that were formed
    pub paired_count: usize,
    /// Pairs dropped during parsing, with the reason
    pub skipped: Vec<ParsingError>,
}

impl Extraction {
    fn push(&mut self, outcome: ParsingResult<ListingRecord>) {
        self.paired_count += 1;
        match outcome {
            Ok(record) => self.records.push(record),
            Err(e) => {
                if e.is_recoverable() {
                    warn!("Skipping result: {}", e);
                } else {
                    error!("Skipping result: {}", e);
                }
                self.skipped.push(e);
            }
        }
    }
}

pub struct RecordExtractor {
    base_url: Url,
    max_anchor_depth: usize,
}

impl RecordExtractor {
    pub fn new(base_url: &str, max_anchor_depth: usize) -> ParsingResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ParsingError::url_resolution_failed(base_url, format!("Invalid base URL: {e}"), None))?;
        Ok(Self {
            base_url,
            max_anchor_depth,
        })
    }

    /// Pair price and rating elements by position.
    ///
    /// Pairing stops at the shorter list; the surplus of the longer one is
    /// dropped because there is no key tying the two lists together.
    pub fn extract<'a>(&self, price_elements: &[ElementRef<'a>], rating_elements: &[ElementRef<'a>]) -> Extraction {
        let mut extraction = Extraction::default();
        if price_elements.is_empty() || rating_elements.is_empty() {
            return extraction;
        }

        if price_elements.len() != rating_elements.len() {
            debug!(
                "Price/rating count mismatch ({} vs {}), pairing first {}",
                price_elements.len(),
                rating_elements.len(),
                price_elements.len().min(rating_elements.len())
            );
        }

        for (price, rating) in price_elements.iter().zip(rating_elements) {
            let outcome = self
                .candidate(*price, *rating, || self.find_listing_link(*price, price_elements))
                .and_then(|candidate| self.parse_candidate(&candidate));
            extraction.push(outcome);
        }

        debug!("Found {} paired results", extraction.paired_count);
        extraction
    }

    /// Pair fields inside each listing container.
    ///
    /// Each container contributes at most one pair: its first price element
    /// and first rating element. Containers missing either field are ignored.
    pub fn extract_from_containers(&self, containers: &[ElementRef<'_>], locator: &FieldLocator) -> Extraction {
        let mut extraction = Extraction::default();

        for container in containers {
            let price = locator.locate_in(*container, FieldKind::Price);
            let rating = locator.locate_in(*container, FieldKind::Rating);
            let (Some(price), Some(rating)) = (price.elements.first(), rating.elements.first()) else {
                continue;
            };

            let outcome = self
                .candidate(*price, *rating, || first_link_in(*container))
                .and_then(|candidate| self.parse_candidate(&candidate));
            extraction.push(outcome);
        }

        debug!(
            "Found {} paired results in {} containers",
            extraction.paired_count,
            containers.len()
        );
        extraction
    }

    /// Read texts and the listing link for one pair
    fn candidate<'a>(
        &self,
        price: ElementRef<'a>,
        rating: ElementRef<'a>,
        find_link: impl FnOnce() -> Option<&'a str>,
    ) -> ParsingResult<ListingCandidate> {
        let price_text = element_text(price);
        let rating_text = element_text(rating);

        if price_text.is_empty() {
            return Err(ParsingError::EmptyFieldText {
                field: FieldKind::Price,
            });
        }
        if rating_text.is_empty() {
            return Err(ParsingError::EmptyFieldText {
                field: FieldKind::Rating,
            });
        }

        let href = find_link().ok_or_else(|| ParsingError::LinkNotFound {
            price_text: price_text.clone(),
        })?;

        Ok(ListingCandidate {
            url: self.resolve_url(href)?,
            price_text,
            rating_text,
        })
    }

    /// Parse a candidate's texts into a validated record
    pub fn parse_candidate(&self, candidate: &ListingCandidate) -> ParsingResult<ListingRecord> {
        let price = parse_price(&candidate.price_text)?;
        let rating = parse_rating(&candidate.rating_text)?;
        ListingRecord::new(candidate.url.clone(), price, rating)
    }

    /// First link at or around the price element.
    ///
    /// Walks up at most `max_anchor_depth` ancestors and stops before any
    /// ancestor that also encloses another listing's price, so a listing
    /// without a link never borrows its neighbour's.
    fn find_listing_link<'a>(&self, price: ElementRef<'a>, all_prices: &[ElementRef<'a>]) -> Option<&'a str> {
        std::iter::once(price)
            .chain(price.ancestors().filter_map(ElementRef::wrap))
            .take(self.max_anchor_depth + 1)
            .take_while(|scope| enclosed_count(*scope, all_prices) <= 1)
            .find_map(first_link_in)
    }

    /// Absolutize a listing link against the site origin
    pub fn resolve_url(&self, href: &str) -> ParsingResult<String> {
        let href = href.trim();
        if href.is_empty() {
            return Err(ParsingError::url_resolution_failed(href, "empty href", Some(self.base_url.as_str())));
        }

        if href.starts_with("http://") || href.starts_with("https://") {
            return Ok(href.to_string());
        }

        self.base_url
            .join(href)
            .map(|url| url.to_string())
            .map_err(|e| {
                ParsingError::url_resolution_failed(
                    href,
                    format!("Failed to join URL: {e}"),
                    Some(self.base_url.as_str()),
                )
            })
    }
}

/// The element itself when it is a link, otherwise its first descendant link
fn first_link_in(element: ElementRef<'_>) -> Option<&str> {
    if element.value().name() == "a" {
        if let Some(href) = element.value().attr("href") {
            return Some(href);
        }
    }
    element
        .select(&LINK_SELECTOR)
        .find_map(|anchor| anchor.value().attr("href"))
}

/// How many of `elements` are `scope` itself or lie inside it
fn enclosed_count(scope: ElementRef<'_>, elements: &[ElementRef<'_>]) -> usize {
    elements
        .iter()
        .filter(|element| element.id() == scope.id() || element.ancestors().any(|node| node.id() == scope.id()))
        .count()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
