//! Domain module - Core listing entities and acceptance policy
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod listing;
pub mod policy;

pub use listing::{ListingCandidate, ListingRecord};
pub use policy::{PolicyFilter, Rejection, accept};
