//! Report Core - where aggregated payout tables go
//!
//! ```text
//! Vec<AggregationRow> → ReportWriter → JSONL or SQLite backend
//!                     → render_top_rows → console
//! ```

pub mod display;
pub mod jsonl_writer;
pub mod sqlite_writer;
pub mod writer;
pub mod writer_backend;

pub use display::{format_usd, render_top_rows};
pub use jsonl_writer::JsonlReportWriter;
pub use sqlite_writer::SqliteReportWriter;
pub use writer::ReportWriter;
pub use writer_backend::{RankedRow, ReportWriterBackend, ReportWriterError};
