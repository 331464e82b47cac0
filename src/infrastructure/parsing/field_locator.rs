//! Field locator with ordered selector fallbacks
//!
//! The target site renames its classes from time to time. For every field the
//! locator tries the primary class first and then each fallback in order,
//! returning the first non-empty match set. Finding nothing is a normal
//! outcome, not an error.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use super::config::{FieldKind, SelectorTable, class_selector};
use super::error::{ParsingError, ParsingResult};

static CLASSED_ELEMENTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[class]").expect("attribute selector is valid"));

/// Query `scope` with the primary selector, then each fallback, and return
/// the first non-empty match set.
pub fn locate<'a>(scope: ElementRef<'a>, primary: &Selector, fallbacks: &[Selector]) -> Vec<ElementRef<'a>> {
    std::iter::once(primary)
        .chain(fallbacks)
        .map(|selector| scope.select(selector).collect::<Vec<_>>())
        .find(|matches| !matches.is_empty())
        .unwrap_or_default()
}

/// A selector paired with the class specification it was compiled from
#[derive(Debug, Clone)]
struct NamedSelector {
    name: String,
    selector: Selector,
}

/// Result of locating one field
#[derive(Debug, Clone)]
pub struct LocatedField<'a> {
    /// Class specification that produced the match, if any did
    pub selector: Option<String>,
    pub elements: Vec<ElementRef<'a>>,
}

impl LocatedField<'_> {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

/// Compiled selector table
#[derive(Debug, Clone)]
pub struct FieldLocator {
    price: Vec<NamedSelector>,
    rating: Vec<NamedSelector>,
    container: Vec<NamedSelector>,
}

impl FieldLocator {
    /// Compile the table. Invalid entries are skipped with a warning; price
    /// and rating must keep at least one usable selector.
    pub fn new(table: &SelectorTable) -> ParsingResult<Self> {
        Ok(Self {
            price: Self::compile_selectors(FieldKind::Price, &table.price, true)?,
            rating: Self::compile_selectors(FieldKind::Rating, &table.rating, true)?,
            container: Self::compile_selectors(FieldKind::Container, &table.container, false)?,
        })
    }

    fn compile_selectors(
        kind: FieldKind,
        class_specs: &[String],
        required: bool,
    ) -> ParsingResult<Vec<NamedSelector>> {
        let mut selectors = Vec::new();
        let mut errors = Vec::new();

        for spec in class_specs {
            match class_selector(spec) {
                Ok(selector) => selectors.push(NamedSelector {
                    name: spec.clone(),
                    selector,
                }),
                Err(e) => {
                    warn!("Failed to compile {} selector '{}': {}", kind, spec, e);
                    errors.push(e.to_string());
                }
            }
        }

        if required && selectors.is_empty() {
            return Err(ParsingError::NoValidSelectors { field: kind, errors });
        }
        Ok(selectors)
    }

    fn selectors(&self, kind: FieldKind) -> &[NamedSelector] {
        match kind {
            FieldKind::Price => &self.price,
            FieldKind::Rating => &self.rating,
            FieldKind::Container => &self.container,
        }
    }

    /// Locate a field anywhere in the document
    pub fn locate<'a>(&self, document: &'a Html, kind: FieldKind) -> LocatedField<'a> {
        self.locate_in(document.root_element(), kind)
    }

    /// Locate a field among the descendants of `scope`
    pub fn locate_in<'a>(&self, scope: ElementRef<'a>, kind: FieldKind) -> LocatedField<'a> {
        let candidates = self.selectors(kind);

        for (rank, named) in candidates.iter().enumerate() {
            let elements: Vec<ElementRef<'a>> = scope.select(&named.selector).collect();
            debug!(
                "Found {} results for {} class '{}'",
                elements.len(),
                kind,
                named.name
            );

            if !elements.is_empty() {
                if rank > 0 {
                    info!(
                        "Using alternative {} class '{}' instead of '{}'",
                        kind, named.name, candidates[0].name
                    );
                }
                return LocatedField {
                    selector: Some(named.name.clone()),
                    elements,
                };
            }
        }

        LocatedField {
            selector: None,
            elements: Vec::new(),
        }
    }
}

/// Every class name present in the document, for diagnosing markup drift
pub fn class_inventory(document: &Html) -> BTreeSet<String> {
    document
        .select(&CLASSED_ELEMENTS)
        .flat_map(|element| element.value().classes().map(ToString::to_string).collect::<Vec<_>>())
        .collect()
}
