//! Unfiltered newest-first scan, used when the filtered fetch returns nothing
//!
//! Pages are filtered locally to the window. Since the stream is ordered
//! newest first, the scan stops as soon as a whole page predates the window
//! start, well before `max_pages` on accounts with long history.

use super::client::PageSource;
use super::error::FetchError;
use super::paginator::CursorPaginator;
use super::resolver::RecordResolver;
use super::types::ActivityRecord;
use super::window::TimeWindow;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    pub records: Vec<ActivityRecord>,
    pub pages_fetched: usize,
    /// Scan ended on a page entirely older than the window
    pub stopped_early: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct FallbackScanner {
    page_size: u32,
    max_pages: usize,
    resolver: RecordResolver,
}

impl FallbackScanner {
    pub fn new(page_size: u32, max_pages: usize) -> Self {
        Self {
            page_size,
            max_pages,
            resolver: RecordResolver::fallback(),
        }
    }

    pub async fn scan<S: PageSource + ?Sized>(
        &self,
        source: &S,
        window: &TimeWindow,
    ) -> Result<FallbackOutcome, FetchError> {
        let mut paginator = CursorPaginator::unfiltered(source, self.page_size, self.max_pages);
        let mut records = Vec::new();
        let mut stopped_early = false;

        while let Some(page) = paginator.next_page().await? {
            let page_records = self.resolver.resolve(&page);

            let entirely_older =
                !page_records.is_empty() && page_records.iter().all(|r| r.activity_at < window.start);

            records.extend(
                page_records
                    .into_iter()
                    .filter(|r| window.contains(r.activity_at) && r.amount > Decimal::ZERO),
            );

            if entirely_older {
                log::debug!(
                    "Fallback page {} predates {}, stopping scan",
                    paginator.pages_fetched(),
                    window.start
                );
                stopped_early = true;
                break;
            }
        }

        log::info!(
            "Fallback scan for {}: {} records in window across {} pages",
            window.label(),
            records.len(),
            paginator.pages_fetched()
        );

        Ok(FallbackOutcome {
            records,
            pages_fetched: paginator.pages_fetched(),
            stopped_early,
        })
    }
}
