#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{error, info, warn};

use auction_scout_lib::crawling::CrawlDriver;
use auction_scout_lib::domain::PolicyFilter;
use auction_scout_lib::infrastructure::{
    AppConfig, ConfigManager, CsvResultSink, HttpClient, ListingPageParser, ResultSink, init_logging_with_config,
    log_system_info,
};

#[tokio::main]
async fn main() -> Result<()> {
    let started_at = Local::now();

    let manager = ConfigManager::new();
    let (config, load_error) = match manager.load_config().await {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    if let Err(e) = init_logging_with_config(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }
    log_system_info();

    if let Some(e) = load_error {
        warn!("⚠️ Ignoring configuration file {:?}: {:#}", manager.config_path(), e);
    }
    if let Err(e) = config.validate() {
        error!("❌ Invalid configuration: {}", e);
        return Ok(());
    }

    let fetcher = match HttpClient::with_config(&config.http, &config.site) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("❌ Failed to build HTTP client: {:#}", e);
            return Ok(());
        }
    };
    let parser = match ListingPageParser::new(&config.parsing) {
        Ok(parser) => Arc::new(parser),
        Err(e) => {
            error!("❌ Failed to build page parser: {}", e);
            return Ok(());
        }
    };

    let driver = CrawlDriver::new(fetcher, parser, PolicyFilter::from(&config.policy), config.crawl.clone());
    let report = driver.run().await;

    let sink = CsvResultSink::new(&config.output, started_at);
    match sink.write(&report.records) {
        Ok(path) => info!("✅ Successfully saved results to {}", path.display()),
        Err(e) => error!("❌ Error saving results: {}", e),
    }

    Ok(())
}
