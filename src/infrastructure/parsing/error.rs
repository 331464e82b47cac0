//! Parsing error re-export
//!
//! The error enum lives next to the other infrastructure errors.

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
