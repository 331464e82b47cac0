//! # Crawl State
//!
//! The driver owns exactly one [`CrawlState`] and threads it through each
//! step by value. Nothing else reads or writes the accumulator.

use crate::domain::ListingRecord;

/// What the last failed attempt looked like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Page parsed but held no candidates while nothing had been collected yet
    EmptyPage,
    HttpStatus(u16),
    Transport(String),
}

/// Why the crawl stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Consecutive failures reached the backoff policy's attempt limit
    RetryBudgetExhausted { last_failure: FailureKind },
    /// Too many empty pages in a row after data had been found
    TrailingEmptyPages,
    /// Configured page ceiling reached
    PageLimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverPhase {
    Running,
    Backoff,
    Terminated(TerminationReason),
}

#[derive(Debug, Clone)]
pub struct CrawlState {
    pub phase: DriverPhase,
    /// 1-based index of the next page to fetch
    pub page_index: u32,
    pub consecutive_empty_retries: u32,
    /// Empty pages seen in a row since the accumulator became non-empty
    pub trailing_empty_pages: u32,
    pub fetch_attempts: u32,
    pub last_failure: Option<FailureKind>,
    pub accumulator: Vec<ListingRecord>,
}

impl CrawlState {
    pub const fn new() -> Self {
        Self {
            phase: DriverPhase::Running,
            page_index: 1,
            consecutive_empty_retries: 0,
            trailing_empty_pages: 0,
            fetch_attempts: 0,
            last_failure: None,
            accumulator: Vec::new(),
        }
    }

    /// Count a failed attempt and move to backoff
    pub fn record_failure(&mut self, failure: FailureKind) {
        self.consecutive_empty_retries += 1;
        self.last_failure = Some(failure);
        self.phase = DriverPhase::Backoff;
    }

    /// Move to the next page and clear the retry counter
    pub fn advance(&mut self) {
        self.page_index += 1;
        self.consecutive_empty_retries = 0;
        self.last_failure = None;
        self.phase = DriverPhase::Running;
    }

    pub fn terminate(&mut self, reason: TerminationReason) {
        self.phase = DriverPhase::Terminated(reason);
    }

    /// Pages that were completed and moved past
    pub const fn pages_visited(&self) -> u32 {
        self.page_index - 1
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

/// Final outcome of a crawl, handed to the result sink
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub records: Vec<ListingRecord>,
    pub pages_visited: u32,
    pub fetch_attempts: u32,
    pub termination: TerminationReason,
}
