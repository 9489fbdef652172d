//! Unified writer interface for payout tables
//!
//! Routes writes to either JSONL or SQLite backend based on configuration.

use super::jsonl_writer::JsonlReportWriter;
use super::sqlite_writer::SqliteReportWriter;
use super::writer_backend::{ReportWriterBackend, ReportWriterError};
use crate::aggregator::AggregationRow;
use crate::config::BackendType;
use std::path::{Path, PathBuf};

pub enum ReportWriter {
    Jsonl(JsonlReportWriter),
    Sqlite(SqliteReportWriter),
}

impl ReportWriter {
    pub fn new(backend: BackendType, path: PathBuf) -> Result<Self, ReportWriterError> {
        match backend {
            BackendType::Jsonl => Ok(ReportWriter::Jsonl(JsonlReportWriter::new(path)?)),
            BackendType::Sqlite => Ok(ReportWriter::Sqlite(SqliteReportWriter::new(path)?)),
        }
    }

    pub async fn write_rows(&mut self, label: &str, rows: &[AggregationRow]) -> Result<(), ReportWriterError> {
        match self {
            ReportWriter::Jsonl(w) => w.write_rows(label, rows),
            ReportWriter::Sqlite(w) => ReportWriterBackend::write_rows(w, label, rows).await,
        }
    }

    pub async fn flush(&mut self) -> Result<(), ReportWriterError> {
        match self {
            ReportWriter::Jsonl(w) => {
                w.flush()?;
                Ok(())
            }
            ReportWriter::Sqlite(w) => w.flush().await,
        }
    }

    pub fn backend_type(&self) -> &'static str {
        match self {
            ReportWriter::Jsonl(_) => "JSONL",
            ReportWriter::Sqlite(_) => "SQLite",
        }
    }

    pub fn location(&self) -> &Path {
        match self {
            ReportWriter::Jsonl(w) => w.location(),
            ReportWriter::Sqlite(w) => w.location(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_routes_to_backend() {
        let dir = tempdir().unwrap();
        let rows = vec![AggregationRow {
            program: "Acme".to_string(),
            total_amount: Decimal::from(5),
            report_count: 1,
        }];

        let mut jsonl = ReportWriter::new(BackendType::Jsonl, dir.path().join("a.jsonl")).unwrap();
        jsonl.write_rows("2025-08", &rows).await.unwrap();
        jsonl.flush().await.unwrap();
        assert_eq!(jsonl.backend_type(), "JSONL");
        assert_eq!(std::fs::read_to_string(jsonl.location()).unwrap().lines().count(), 1);

        let mut sqlite = ReportWriter::new(BackendType::Sqlite, dir.path().join("a.db")).unwrap();
        sqlite.write_rows("2025-08", &rows).await.unwrap();
        sqlite.flush().await.unwrap();
        assert_eq!(sqlite.backend_type(), "SQLite");
        assert!(sqlite.location().exists());
    }
}
