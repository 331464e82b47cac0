//! Infrastructure layer for fetching, parsing and persisting listings
//!
//! This module provides the HTTP page fetcher, HTML parsing, configuration
//! loading, logging setup and the CSV result sink.

pub mod config; // Configuration defaults and overlay loading
pub mod csv_sink;
pub mod logging; // Logging infrastructure
pub mod parsing; // Selector fallback parsing
pub mod parsing_error; // Enhanced error types
pub mod simple_http_client;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, ConfigManager, player_auctions};
pub use csv_sink::{CsvResultSink, ResultSink, SinkError};
pub use logging::{init_logging_with_config, log_system_info};
pub use parsing::{ListingPageParser, PageParser, ParsingConfig, ParsingError, ParsingResult};
pub use simple_http_client::{FetchOutcome, FetchedPage, HttpClient, PageFetcher};
