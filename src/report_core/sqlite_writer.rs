//! SQLite writer for payout tables
//!
//! Each call stores one ranked table under its label and generation time,
//! so repeated runs for the same month sit side by side.

use super::writer_backend::{RankedRow, ReportWriterBackend, ReportWriterError};
use crate::aggregator::AggregationRow;
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

pub struct SqliteReportWriter {
    path: PathBuf,
    conn: Connection,
}

impl SqliteReportWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ReportWriterError> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        apply_optimized_pragmas(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS program_payouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                rank INTEGER NOT NULL,
                program TEXT NOT NULL,
                total_bounty_usd REAL NOT NULL,
                total_bounty_exact TEXT NOT NULL,
                report_count INTEGER NOT NULL,
                generated_at INTEGER NOT NULL,
                UNIQUE(label, program, generated_at)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_label_rank ON program_payouts(label, generated_at DESC, rank)",
            [],
        )?;

        log::info!("✅ SQLite payout writer initialized: {}", path.display());

        Ok(Self { path, conn })
    }
}

#[async_trait]
impl ReportWriterBackend for SqliteReportWriter {
    async fn write_rows(&mut self, label: &str, rows: &[AggregationRow]) -> Result<(), ReportWriterError> {
        let generated_at = chrono::Utc::now().timestamp();
        let ranked = RankedRow::rank_all(label, rows, generated_at);

        let tx = self.conn.transaction()?;
        for (row, exact) in ranked.iter().zip(rows) {
            tx.execute(
                "INSERT OR REPLACE INTO program_payouts
                 (label, rank, program, total_bounty_usd, total_bounty_exact, report_count, generated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.label,
                    row.rank as i64,
                    row.program,
                    row.total_bounty_usd,
                    exact.total_amount.to_string(),
                    row.report_count as i64,
                    row.generated_at,
                ],
            )?;
        }
        tx.commit()?;

        log::debug!("✅ Stored {} payout rows for {}", rows.len(), label);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ReportWriterError> {
        // rows are committed per write
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
