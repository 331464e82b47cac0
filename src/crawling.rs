//! # Crawling Module
//!
//! Sequential crawl driver and the pieces it is built from
//! - 명시적 모듈 구조 (mod.rs 비사용)
//! - 상태는 드라이버가 단독 소유
//! - 대기 시간은 `Sleeper`로 주입 가능

pub mod backoff;
pub mod orchestrator;
pub mod state;

// Clean re-exports
pub use backoff::{BackoffPolicy, JitterRange, PauseKind, Sleeper, TokioSleeper};
pub use orchestrator::CrawlDriver;
pub use state::{CrawlReport, CrawlState, DriverPhase, FailureKind, TerminationReason};
