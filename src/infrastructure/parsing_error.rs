//! Parsing error types for listing extraction
//!
//! Every failure that can happen while turning a listing page into records is
//! represented here. Most of them only drop a single pair; selector
//! compilation failures are the exception because they come from configuration.

use thiserror::Error;

use crate::infrastructure::parsing::config::FieldKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("Empty {field} text")]
    EmptyFieldText { field: FieldKind },

    #[error("Could not parse {field} from: {text}")]
    PatternMismatch { field: FieldKind, text: String },

    #[error("Invalid {field} value '{text}': {reason}")]
    InvalidNumber {
        field: FieldKind,
        text: String,
        reason: String,
    },

    #[error("No listing link found near price '{price_text}'")]
    LinkNotFound { price_text: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No valid selectors for field '{field}'")]
    NoValidSelectors { field: FieldKind, errors: Vec<String> },
}

impl ParsingError {
    /// Create a pattern mismatch error for the given field text
    pub fn pattern_mismatch(field: FieldKind, text: &str) -> Self {
        Self::PatternMismatch {
            field,
            text: text.to_string(),
        }
    }

    /// Create an invalid number error with the underlying reason
    pub fn invalid_number(field: FieldKind, text: &str, reason: impl ToString) -> Self {
        Self::InvalidNumber {
            field,
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a URL resolution error
    pub fn url_resolution_failed(url: &str, reason: impl ToString, base_url: Option<&str>) -> Self {
        Self::UrlResolutionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
            base_url: base_url.map(ToString::to_string),
        }
    }

    /// Check if this error only affects the current pair
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::EmptyFieldText { .. }
            | Self::PatternMismatch { .. }
            | Self::InvalidNumber { .. }
            | Self::LinkNotFound { .. }
            | Self::UrlResolutionFailed { .. } => true,
            Self::InvalidSelector { .. } | Self::NoValidSelectors { .. } => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
