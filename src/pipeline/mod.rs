//! # Payout Pipeline
//!
//! Turns month tokens into ordered per-program payout tables.
//!
//! ## Module Organization
//!
//! - `engine` - one month: filtered fetch, fallback scan, aggregation
//! - `scheduler` - several months on a bounded worker pool
//! - `backoff` - retry delays used by the scheduler around whole months

pub mod backoff;
pub mod engine;
pub mod scheduler;

pub use backoff::{ExponentialBackoff, MaxRetriesExceeded};
pub use engine::{MonthReport, PayoutPipeline, RecordSource};
pub use scheduler::{MonthScheduler, ScheduleError, WindowReport};
