//! JSONL writer for payout tables - one ranked row per line

use super::writer_backend::{RankedRow, ReportWriterBackend, ReportWriterError};
use crate::aggregator::AggregationRow;
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct JsonlReportWriter {
    path: PathBuf,
    writer: BufWriter<fs::File>,
}

impl JsonlReportWriter {
    pub fn new(path: PathBuf) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::info!("📝 Writing payout rows to: {}", path.display());

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn write_rows(&mut self, label: &str, rows: &[AggregationRow]) -> Result<(), ReportWriterError> {
        let generated_at = chrono::Utc::now().timestamp();

        for ranked in RankedRow::rank_all(label, rows, generated_at) {
            let json = serde_json::to_string(&ranked)?;
            writeln!(self.writer, "{}", json)?;
        }

        log::debug!("Wrote {} rows for {} to {}", rows.len(), label, self.path.display());
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for JsonlReportWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[async_trait]
impl ReportWriterBackend for JsonlReportWriter {
    async fn write_rows(&mut self, label: &str, rows: &[AggregationRow]) -> Result<(), ReportWriterError> {
        JsonlReportWriter::write_rows(self, label, rows)
    }

    async fn flush(&mut self) -> Result<(), ReportWriterError> {
        JsonlReportWriter::flush(self)?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
