//! Multi-month runs on a bounded worker pool
//!
//! Months are independent, so up to `workers` of them are fetched at once.
//! Workers share only the page source; results are collected and put back
//! into month order before the combined aggregation.
//!
//! Each month is wrapped in the caller-side retry policy: transient remote
//! failures are retried with exponential backoff, invalid month tokens and
//! malformed payloads are not.

use super::backoff::ExponentialBackoff;
use super::engine::{MonthReport, PayoutPipeline};
use crate::aggregator::{aggregate, AggregationRow};
use crate::fetch_core::FetchError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug)]
pub enum ScheduleError {
    Month { month: String, error: FetchError },
    Worker(String),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::Month { month, error } => write!(f, "Month {} failed: {}", month, error),
            ScheduleError::Worker(msg) => write!(f, "Worker task failed: {}", msg),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Per-month reports plus the aggregation over all of them
#[derive(Debug, Clone)]
pub struct WindowReport {
    pub months: Vec<MonthReport>,
    pub rows: Vec<AggregationRow>,
}

impl WindowReport {
    pub fn record_count(&self) -> usize {
        self.months.iter().map(|m| m.records.len()).sum()
    }
}

#[derive(Clone)]
pub struct MonthScheduler {
    pipeline: PayoutPipeline,
    workers: usize,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl MonthScheduler {
    pub fn new(pipeline: PayoutPipeline, workers: usize) -> Self {
        Self {
            pipeline,
            workers: workers.max(1),
            max_retries: 0,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }

    pub fn with_retries(mut self, max_retries: u32, initial: Duration, max: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Run every month; the first failing month aborts the rest
    pub async fn run(&self, months: &[String]) -> Result<WindowReport, ScheduleError> {
        log::info!(
            "⏰ Scheduling {} months on {} workers",
            months.len(),
            self.workers
        );

        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (idx, month) in months.iter().cloned().enumerate() {
            let permits = permits.clone();
            let scheduler = self.clone();
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ScheduleError::Worker(e.to_string()))?;
                let report = scheduler.run_with_retry(&month).await?;
                Ok::<_, ScheduleError>((idx, report))
            });
        }

        let mut slots: Vec<Option<MonthReport>> = vec![None; months.len()];
        while let Some(joined) = tasks.join_next().await {
            let (idx, report) = joined.map_err(|e| ScheduleError::Worker(e.to_string()))??;
            slots[idx] = Some(report);
        }

        let reports: Vec<MonthReport> = slots.into_iter().flatten().collect();
        let rows = aggregate(reports.iter().flat_map(|r| r.records.iter()));

        Ok(WindowReport { months: reports, rows })
    }

    async fn run_with_retry(&self, month: &str) -> Result<MonthReport, ScheduleError> {
        let mut backoff = ExponentialBackoff::new(self.initial_backoff, self.max_backoff, self.max_retries);

        loop {
            match self.pipeline.run_month(month).await {
                Ok(report) => return Ok(report),
                Err(error @ FetchError::RemoteFetchFailed { .. }) => {
                    log::warn!("Month {} fetch failed: {}", month, error);
                    if backoff.sleep().await.is_err() {
                        return Err(ScheduleError::Month {
                            month: month.to_string(),
                            error,
                        });
                    }
                }
                Err(error) => {
                    return Err(ScheduleError::Month {
                        month: month.to_string(),
                        error,
                    })
                }
            }
        }
    }
}
