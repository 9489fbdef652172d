//! Writer backend trait for aggregated payout tables
//!
//! Defines the interface for handing ranked `AggregationRow`s to different
//! storage backends. Paths and formats are chosen by the backend, never by
//! the pipeline.

use crate::aggregator::AggregationRow;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::path::Path;

/// Failure while storing a payout table
#[derive(Debug)]
pub enum ReportWriterError {
    Io(std::io::Error),
    Encode(serde_json::Error),
    Sqlite(rusqlite::Error),
}

impl From<std::io::Error> for ReportWriterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ReportWriterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

impl From<rusqlite::Error> for ReportWriterError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

impl std::fmt::Display for ReportWriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed writing payout output: {}", e),
            Self::Encode(e) => write!(f, "failed encoding payout row: {}", e),
            Self::Sqlite(e) => write!(f, "failed storing payout rows in SQLite: {}", e),
        }
    }
}

impl std::error::Error for ReportWriterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Encode(e) => Some(e),
            Self::Sqlite(e) => Some(e),
        }
    }
}

/// One output line: an aggregation row with its rank and report label
#[derive(Debug, Clone, Serialize)]
pub struct RankedRow {
    /// Month (`2025-08`) or month range (`2025-03..2025-08`) the row covers
    pub label: String,
    pub rank: usize,
    pub program: String,
    pub total_bounty_usd: f64,
    pub report_count: usize,
    pub generated_at: i64,
}

impl RankedRow {
    /// Rank rows 1..=n in their given order
    pub fn rank_all(label: &str, rows: &[AggregationRow], generated_at: i64) -> Vec<RankedRow> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| RankedRow {
                label: label.to_string(),
                rank: idx + 1,
                program: row.program.clone(),
                total_bounty_usd: row.total_amount.to_f64().unwrap_or(0.0),
                report_count: row.report_count,
                generated_at,
            })
            .collect()
    }
}

#[async_trait]
pub trait ReportWriterBackend: Send {
    /// Write one aggregation table, rows already in rank order
    async fn write_rows(&mut self, label: &str, rows: &[AggregationRow]) -> Result<(), ReportWriterError>;

    /// Flush pending writes to storage
    async fn flush(&mut self) -> Result<(), ReportWriterError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;

    /// File the rows end up in
    fn location(&self) -> &Path;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::error::Error;

    #[test]
    fn test_rank_all_numbers_rows_in_order() {
        let rows = vec![
            AggregationRow { program: "Acme".to_string(), total_amount: Decimal::new(12345, 2), report_count: 3 },
            AggregationRow { program: "Globex".to_string(), total_amount: Decimal::from(7), report_count: 1 },
        ];

        let ranked = RankedRow::rank_all("2025-08", &rows, 1_700_000_000);

        assert_eq!(ranked[0].rank, 1);
        assert!((ranked[0].total_bounty_usd - 123.45).abs() < 1e-9);
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[1].label, "2025-08");
    }

    #[test]
    fn test_error_keeps_underlying_cause() {
        let err = ReportWriterError::from(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"));

        assert!(err.to_string().starts_with("failed writing payout output"));
        assert_eq!(err.source().map(|e| e.to_string()), Some("read-only".to_string()));
    }
}
