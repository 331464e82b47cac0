//! # Crawl Driver
//!
//! Walks the listing pages one at a time:
//! fetch → locate → extract → filter → accumulate.
//!
//! Failed fetches and empty pages before any data has been collected share a
//! single retry budget. The same page is retried with exponential backoff
//! until the budget runs out. Once the accumulator holds data, an empty page
//! no longer triggers backoff and the crawl simply moves on.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::crawling::backoff::{PauseKind, Sleeper, TokioSleeper};
use crate::crawling::state::{CrawlReport, CrawlState, DriverPhase, FailureKind, TerminationReason};
use crate::domain::PolicyFilter;
use crate::infrastructure::config::CrawlConfig;
use crate::infrastructure::parsing::{PageParser, ParseContext};
use crate::infrastructure::simple_http_client::{FetchOutcome, PageFetcher};

/// Sequential page crawler with a bounded retry budget
pub struct CrawlDriver {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn PageParser>,
    filter: PolicyFilter,
    config: CrawlConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl CrawlDriver {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn PageParser>,
        filter: PolicyFilter,
        config: CrawlConfig,
    ) -> Self {
        Self {
            fetcher,
            parser,
            filter,
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the real-time sleeper
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Crawl until the driver reaches its terminal state
    pub async fn run(&self) -> CrawlReport {
        info!(
            "🚀 Starting crawl (retry budget {}, price < {}, rating <= {})",
            self.config.backoff.max_attempts,
            self.filter.price_limit(),
            self.filter.rating_limit()
        );

        let mut state = CrawlState::new();
        loop {
            let phase = state.phase.clone();
            state = match phase {
                DriverPhase::Running => self.run_page(state).await,
                DriverPhase::Backoff => self.back_off(state).await,
                DriverPhase::Terminated(reason) => return Self::finish(state, reason),
            };
        }
    }

    async fn run_page(&self, mut state: CrawlState) -> CrawlState {
        if self.past_page_limit(&mut state) {
            return state;
        }

        let page_index = state.page_index;
        info!("Processing page {}", page_index);
        state.fetch_attempts += 1;

        match self.fetcher.fetch(page_index).await {
            FetchOutcome::Success(page) => {
                let context = ParseContext::new(page_index, page.url);
                let extraction = self.parser.parse_page(&page.body, &context);
                let found = extraction.has_candidates();
                let paired = extraction.paired_count;
                let skipped = extraction.skipped_count;

                let (accepted, rejected) = self.filter.partition(extraction.records);
                info!(
                    "Page {}: {} paired, {} skipped, {} accepted, {} rejected",
                    page_index,
                    paired,
                    skipped,
                    accepted.len(),
                    rejected
                );
                state.accumulator.extend(accepted);

                if !found && state.accumulator.is_empty() {
                    warn!(
                        "No results found. Retry {}/{}",
                        state.consecutive_empty_retries + 1,
                        self.config.backoff.max_attempts
                    );
                    state.record_failure(FailureKind::EmptyPage);
                    return state;
                }

                state.trailing_empty_pages = if found { 0 } else { state.trailing_empty_pages + 1 };
                state.advance();

                if let Some(limit) = self.config.max_trailing_empty_pages {
                    if state.trailing_empty_pages >= limit {
                        info!("{} empty pages in a row, assuming end of listings", state.trailing_empty_pages);
                        state.terminate(TerminationReason::TrailingEmptyPages);
                        return state;
                    }
                }
                if self.past_page_limit(&mut state) {
                    return state;
                }

                let pause = self.config.success_delay.sample();
                debug!("Waiting {:?} before page {}", pause, state.page_index);
                self.sleeper.sleep(pause, PauseKind::Jitter).await;
            }
            FetchOutcome::HttpError(status) => {
                error!("HTTP Error {} on page {}", status, page_index);
                state.record_failure(FailureKind::HttpStatus(status));
            }
            FetchOutcome::TransportError(cause) => {
                error!("Error connecting to site on page {}: {}", page_index, cause);
                state.record_failure(FailureKind::Transport(cause));
            }
        }

        state
    }

    /// Terminate once the current page lies beyond `max_pages`
    fn past_page_limit(&self, state: &mut CrawlState) -> bool {
        match self.config.max_pages {
            Some(max_pages) if state.page_index > max_pages => {
                info!("Reached page limit ({})", max_pages);
                state.terminate(TerminationReason::PageLimitReached);
                true
            }
            _ => false,
        }
    }

    async fn back_off(&self, mut state: CrawlState) -> CrawlState {
        let policy = &self.config.backoff;

        if !policy.should_retry(state.consecutive_empty_retries) {
            warn!(
                "Giving up on page {} after {} consecutive failures",
                state.page_index, state.consecutive_empty_retries
            );
            let last_failure = state.last_failure.clone().unwrap_or(FailureKind::EmptyPage);
            state.terminate(TerminationReason::RetryBudgetExhausted { last_failure });
            return state;
        }

        let delay = policy.delay_for(state.consecutive_empty_retries);
        info!("Waiting {:?} before retrying page {}", delay, state.page_index);
        self.sleeper.sleep(delay, PauseKind::Backoff).await;

        state.phase = DriverPhase::Running;
        state
    }

    fn finish(state: CrawlState, termination: TerminationReason) -> CrawlReport {
        info!("Crawl stopped: {:?}", termination);
        info!(
            "Final results: {} listings found across {} pages",
            state.accumulator.len(),
            state.pages_visited()
        );

        CrawlReport {
            pages_visited: state.pages_visited(),
            fetch_attempts: state.fetch_attempts,
            records: state.accumulator,
            termination,
        }
    }
}
