//! Pipeline Engine - per-month fetch, fallback, and aggregation
//!
//! ## Flow
//!
//! ```text
//! month token
//!     ↓
//! TimeWindow::for_month → build_filter
//!     ↓
//! CursorPaginator::filtered + RecordResolver::primary
//!     ↓  nothing inside the window?
//! FallbackScanner (unfiltered, newest first)
//!     ↓
//! aggregate() → MonthReport
//! ```
//!
//! One month is strictly sequential: every page request depends on the
//! cursor of the page before it. The engine never retries; callers wrap
//! `run_month` in their own policy (see `scheduler`).

use crate::aggregator::{aggregate, AggregationRow};
use crate::config::FetchConfig;
use crate::fetch_core::{
    build_filter, ActivityRecord, CursorPaginator, FallbackScanner, FetchError, PageSource,
    RecordResolver, TimeWindow,
};
use std::sync::Arc;

/// Which fetch strategy produced a month's records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Filtered,
    Fallback,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::Filtered => "filtered",
            RecordSource::Fallback => "fallback",
        }
    }
}

/// Output of one month's run
#[derive(Debug, Clone)]
pub struct MonthReport {
    pub month: String,
    pub window: TimeWindow,
    /// Records in fetch order, handed to raw archival as-is
    pub records: Vec<ActivityRecord>,
    pub rows: Vec<AggregationRow>,
    pub source: RecordSource,
    pub pages_fetched: usize,
}

impl MonthReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Month pipeline over a shared page source
///
/// Cheap to clone; clones share the source, nothing else.
#[derive(Clone)]
pub struct PayoutPipeline {
    source: Arc<dyn PageSource>,
    page_size: u32,
    max_pages: usize,
}

impl PayoutPipeline {
    pub fn new(source: Arc<dyn PageSource>, page_size: u32, max_pages: usize) -> Self {
        Self {
            source,
            page_size,
            max_pages,
        }
    }

    pub fn from_config(source: Arc<dyn PageSource>, config: &FetchConfig) -> Self {
        Self::new(source, config.page_size, config.max_pages)
    }

    /// Fetch, fall back if needed, and aggregate one `YYYY-MM` month
    pub async fn run_month(&self, month: &str) -> Result<MonthReport, FetchError> {
        let window = TimeWindow::for_month(month)?;
        log::info!("📅 Fetching payouts for {} [{} → {})", window.label(), window.start, window.end);

        let (records, pages_fetched) = self.fetch_filtered(&window).await?;

        let (records, source, pages_fetched) = if records.is_empty() {
            log::info!("Filtered fetch returned nothing for {}, falling back to unfiltered scan", window.label());
            let outcome = FallbackScanner::new(self.page_size, self.max_pages)
                .scan(self.source.as_ref(), &window)
                .await?;
            (outcome.records, RecordSource::Fallback, pages_fetched + outcome.pages_fetched)
        } else {
            (records, RecordSource::Filtered, pages_fetched)
        };

        let rows = aggregate(&records);
        log::info!(
            "✅ {}: {} records, {} programs ({} fetch, {} pages)",
            window.label(),
            records.len(),
            rows.len(),
            source.as_str(),
            pages_fetched
        );

        Ok(MonthReport {
            month: window.label(),
            window,
            records,
            rows,
            source,
            pages_fetched,
        })
    }

    /// Records from the server-filtered stream that fall inside the window
    async fn fetch_filtered(&self, window: &TimeWindow) -> Result<(Vec<ActivityRecord>, usize), FetchError> {
        let resolver = RecordResolver::primary();
        let mut paginator = CursorPaginator::filtered(
            self.source.as_ref(),
            build_filter(window),
            self.page_size,
            self.max_pages,
        );

        let mut records = Vec::new();
        let mut outside = 0usize;
        while let Some(page) = paginator.next_page().await? {
            for record in resolver.resolve(&page) {
                if window.contains(record.activity_at) {
                    records.push(record);
                } else {
                    outside += 1;
                }
            }
        }

        if outside > 0 {
            log::warn!(
                "Server filter let {} records outside {} through; discarded",
                outside,
                window.label()
            );
        }

        Ok((records, paginator.pages_fetched()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Serves filtered and unfiltered requests from separate queues
    struct TwoStreamSource {
        filtered: Mutex<Vec<Value>>,
        unfiltered: Mutex<Vec<Value>>,
        unfiltered_calls: Mutex<usize>,
    }

    impl TwoStreamSource {
        fn new(filtered: Vec<Value>, unfiltered: Vec<Value>) -> Self {
            Self {
                filtered: Mutex::new(filtered.into_iter().rev().collect()),
                unfiltered: Mutex::new(unfiltered.into_iter().rev().collect()),
                unfiltered_calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for TwoStreamSource {
        async fn fetch_page(&self, params: &[(String, String)]) -> Result<Value, FetchError> {
            let is_filtered = params.iter().any(|(k, _)| k == "querystring");
            let queue = if is_filtered {
                &self.filtered
            } else {
                *self.unfiltered_calls.lock().unwrap() += 1;
                &self.unfiltered
            };
            Ok(queue.lock().unwrap().pop().unwrap_or_else(|| json!({ "data": [] })))
        }
    }

    fn filtered_node(id: &str, program: &str, amount: i64, at: &str) -> Value {
        json!({
            "id": id,
            "attributes": { "total_awarded_amount": amount, "latest_disclosable_activity_at": at },
            "relationships": { "program": { "data": { "id": program, "type": "program", "attributes": { "name": program } } } }
        })
    }

    fn fallback_node(id: &str, amount: i64, at: &str) -> Value {
        json!({
            "id": id,
            "attributes": { "total_awarded_amount": amount, "disclosed_at": at },
            "relationships": { "team": { "data": { "id": "t", "type": "team" } } }
        })
    }

    fn pipeline(source: TwoStreamSource) -> (PayoutPipeline, Arc<TwoStreamSource>) {
        let source = Arc::new(source);
        (PayoutPipeline::new(source.clone(), 100, 20), source)
    }

    #[tokio::test]
    async fn test_two_page_month() {
        // Test: cursor-linked pages aggregate into one program row
        let (pipeline, source) = pipeline(TwoStreamSource::new(
            vec![
                json!({ "data": [filtered_node("a", "X", 100, "2025-08-05")], "links": { "next": "c1" } }),
                json!({ "data": [filtered_node("b", "X", 50, "2025-08-20")] }),
            ],
            vec![],
        ));

        let report = pipeline.run_month("2025-08").await.unwrap();

        assert_eq!(report.source, RecordSource::Filtered);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(
            report.rows,
            vec![AggregationRow { program: "X".to_string(), total_amount: Decimal::from(150), report_count: 2 }]
        );
        assert_eq!(*source.unfiltered_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fallback_when_filtered_empty() {
        // Test: empty filtered stream hands over to the unfiltered scan
        let (pipeline, source) = pipeline(TwoStreamSource::new(
            vec![json!({ "data": [] })],
            vec![
                json!({
                    "data": [fallback_node("n1", 200, "2025-08-10T00:00:00Z")],
                    "included": [{ "id": "t", "type": "team", "attributes": { "name": "Acme" } }],
                    "links": { "next": "u1" }
                }),
                json!({ "data": [fallback_node("old", 999, "2025-07-10T00:00:00Z")], "links": { "next": "u2" } }),
                json!({ "data": [fallback_node("never", 1, "2025-08-11T00:00:00Z")] }),
            ],
        ));

        let report = pipeline.run_month("2025-08").await.unwrap();

        assert_eq!(report.source, RecordSource::Fallback);
        assert_eq!(*source.unfiltered_calls.lock().unwrap(), 2);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].program, "Acme");
        assert_eq!(report.rows[0].total_amount, Decimal::from(200));
    }

    #[tokio::test]
    async fn test_out_of_window_filtered_records_trigger_fallback() {
        // Test: a filter the server ignored is caught by the local window check
        let (pipeline, source) = pipeline(TwoStreamSource::new(
            vec![json!({ "data": [filtered_node("a", "X", 100, "2025-06-05")] })],
            vec![],
        ));

        let report = pipeline.run_month("2025-08").await.unwrap();

        assert_eq!(report.source, RecordSource::Fallback);
        assert!(report.is_empty());
        assert_eq!(*source.unfiltered_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_month_fetches_nothing() {
        let (pipeline, source) = pipeline(TwoStreamSource::new(vec![], vec![]));

        let err = pipeline.run_month("2025-13").await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidWindowToken(_)));
        assert_eq!(*source.unfiltered_calls.lock().unwrap(), 0);
    }
}
