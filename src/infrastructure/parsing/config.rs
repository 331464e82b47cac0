//! Parsing configuration for listing extraction
//!
//! Centralized selector table. Each field kind maps to an ordered list of
//! class names; the first entry is the primary selector and the rest are
//! fallbacks tried in order when the site renames its markup.

use std::fmt;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use super::error::{ParsingError, ParsingResult};

/// Field kinds the locator knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Price,
    Rating,
    /// Element enclosing one whole listing
    Container,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Price => "price",
            Self::Rating => "rating",
            Self::Container => "container",
        };
        f.write_str(name)
    }
}

/// Main parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Base origin used to absolutize listing links
    pub base_url: String,

    /// Ordered selector candidates per field
    pub selectors: SelectorTable,

    /// How many ancestors of a price element are searched for a listing link
    pub max_anchor_depth: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        use crate::infrastructure::config::player_auctions;
        Self {
            base_url: player_auctions::BASE_URL.to_string(),
            selectors: SelectorTable::default(),
            max_anchor_depth: 3,
        }
    }
}

/// Class-name selectors per field kind, in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    pub price: Vec<String>,
    pub rating: Vec<String>,
    pub container: Vec<String>,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            price: vec![
                "offer-price-tag".to_string(),
                "product-price".to_string(),
                "price-tag".to_string(),
                "price".to_string(),
                "listing-price".to_string(),
                "offer-price".to_string(),
            ],
            rating: vec![
                "offer-rating offer-item-rating".to_string(),
                "rating".to_string(),
                "user-rating".to_string(),
                "seller-rating".to_string(),
                "item-rating".to_string(),
            ],
            container: vec![
                "product-item".to_string(),
                "offer-item".to_string(),
                "listing-item".to_string(),
            ],
        }
    }
}

impl SelectorTable {
    /// All candidates for a field, primary first
    pub fn candidates(&self, kind: FieldKind) -> &[String] {
        match kind {
            FieldKind::Price => &self.price,
            FieldKind::Rating => &self.rating,
            FieldKind::Container => &self.container,
        }
    }

    pub fn primary(&self, kind: FieldKind) -> Option<&str> {
        self.candidates(kind).first().map(String::as_str)
    }

    pub fn fallbacks(&self, kind: FieldKind) -> &[String] {
        self.candidates(kind).get(1..).unwrap_or_default()
    }
}

/// Compile a class-name specification into an exact class selector.
///
/// `"offer-rating offer-item-rating"` becomes `.offer-rating.offer-item-rating`,
/// so an element must carry every listed class.
pub fn class_selector(class_names: &str) -> ParsingResult<Selector> {
    let classes: Vec<&str> = class_names.split_whitespace().collect();
    if classes.is_empty() {
        return Err(ParsingError::invalid_selector(class_names, "no class names given"));
    }

    let css: String = classes.iter().map(|class| format!(".{class}")).collect();
    Selector::parse(&css).map_err(|e| ParsingError::invalid_selector(class_names, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn default_table_orders_primary_first() {
        let table = SelectorTable::default();
        assert_eq!(table.primary(FieldKind::Price), Some("offer-price-tag"));
        assert_eq!(table.fallbacks(FieldKind::Price).len(), 5);
        assert_eq!(table.primary(FieldKind::Rating), Some("offer-rating offer-item-rating"));
    }

    #[test]
    fn empty_field_has_no_fallbacks() {
        let table = SelectorTable {
            container: vec![],
            ..SelectorTable::default()
        };
        assert_eq!(table.primary(FieldKind::Container), None);
        assert!(table.fallbacks(FieldKind::Container).is_empty());
    }

    #[test]
    fn compound_class_selector_requires_every_class() {
        let selector = class_selector("offer-rating offer-item-rating").unwrap();
        let html = Html::parse_fragment(
            r#"<span class="offer-rating">1</span><span class="offer-item-rating offer-rating">2</span>"#,
        );
        let texts: Vec<String> = html.select(&selector).map(|e| e.text().collect()).collect();
        assert_eq!(texts, vec!["2"]);
    }

    #[test]
    fn blank_class_name_is_rejected() {
        assert!(matches!(
            class_selector("   "),
            Err(ParsingError::InvalidSelector { .. })
        ));
    }
}
