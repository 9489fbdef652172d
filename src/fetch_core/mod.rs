//! Fetch Core - hacktivity page retrieval and record resolution
//!
//! # Architecture
//!
//! ```text
//! YYYY-MM → TimeWindow → build_filter
//!     ↓
//! CursorPaginator (filtered, probes filter parameter spelling)
//!     ↓
//! RecordResolver (inline / relationship / included fallbacks)
//!     ↓  zero records?
//! FallbackScanner (unfiltered newest-first, local window filter)
//! ```

pub mod client;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod paginator;
pub mod resolver;
pub mod types;
pub mod window;

pub use client::{HacktivityClient, PageSource};
pub use error::FetchError;
pub use fallback::{FallbackOutcome, FallbackScanner};
pub use filter::build_filter;
pub use paginator::{extract_next_cursor, unwrap_cursor, CursorPaginator};
pub use resolver::{RecordResolver, ResolverProfile, FALLBACK_PROFILE, PRIMARY_PROFILE};
pub use types::{ActivityRecord, UNKNOWN_PROGRAM};
pub use window::{month_range, TimeWindow};
