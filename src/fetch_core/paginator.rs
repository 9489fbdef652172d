//! Cursor-driven page fetching
//!
//! Pages are fetched strictly one after another: each request needs the
//! cursor returned by the previous page. A stream ends when no cursor can
//! be resolved, a page carries no records, or `max_pages` is reached.
//!
//! The filtered stream probes several spellings of the filter parameter on
//! its first page, since accepted names differ across API versions. The
//! first spelling that returns a success status is kept for the rest of
//! the stream; failed spellings are never retried.

use super::client::PageSource;
use super::error::FetchError;
use reqwest::Url;
use serde_json::Value;

pub const CURSOR_PARAM: &str = "page[cursor]";
pub const PAGE_SIZE_PARAM: &str = "page[size]";

/// Filter parameter names, in probe order
pub const FILTER_PARAM_SPELLINGS: [&str; 4] = ["querystring", "filter[query]", "query", "filter[q]"];

/// Base for resolving relative `links.next` values
const RELATIVE_LINK_BASE: &str = "http://cursor.invalid/";

#[derive(Debug, Clone, PartialEq)]
enum QueryMode {
    Filtered {
        filter: String,
        accepted_spelling: Option<&'static str>,
    },
    Unfiltered,
}

pub struct CursorPaginator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    base_params: Vec<(String, String)>,
    mode: QueryMode,
    cursor: Option<String>,
    max_pages: usize,
    pages_fetched: usize,
    finished: bool,
}

impl<'a, S: PageSource + ?Sized> CursorPaginator<'a, S> {
    /// Stream of pages selected server-side by `filter`
    pub fn filtered(source: &'a S, filter: String, page_size: u32, max_pages: usize) -> Self {
        let base_params = vec![
            (PAGE_SIZE_PARAM.to_string(), page_size.to_string()),
            ("include".to_string(), "program,award".to_string()),
            ("fields[program]".to_string(), "name,handle".to_string()),
        ];
        Self::with_mode(
            source,
            base_params,
            QueryMode::Filtered {
                filter,
                accepted_spelling: None,
            },
            max_pages,
        )
    }

    /// Newest-first stream with no server-side filter
    pub fn unfiltered(source: &'a S, page_size: u32, max_pages: usize) -> Self {
        let base_params = vec![
            (PAGE_SIZE_PARAM.to_string(), page_size.to_string()),
            ("include".to_string(), "team".to_string()),
            ("fields[team]".to_string(), "name".to_string()),
        ];
        Self::with_mode(source, base_params, QueryMode::Unfiltered, max_pages)
    }

    fn with_mode(
        source: &'a S,
        base_params: Vec<(String, String)>,
        mode: QueryMode,
        max_pages: usize,
    ) -> Self {
        Self {
            source,
            base_params,
            mode,
            cursor: None,
            max_pages,
            pages_fetched: 0,
            finished: false,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Filter parameter name the server accepted, once the probe has run
    pub fn accepted_spelling(&self) -> Option<&'static str> {
        match &self.mode {
            QueryMode::Filtered { accepted_spelling, .. } => *accepted_spelling,
            QueryMode::Unfiltered => None,
        }
    }

    /// Fetch the next page, or `None` once the stream has ended
    ///
    /// Pages with no records end the stream and are not returned.
    pub async fn next_page(&mut self) -> Result<Option<Value>, FetchError> {
        if self.finished || self.pages_fetched >= self.max_pages {
            self.finished = true;
            return Ok(None);
        }

        let mut params = self.base_params.clone();
        if let Some(cursor) = &self.cursor {
            params.push((CURSOR_PARAM.to_string(), cursor.clone()));
        }

        let page = match &mut self.mode {
            QueryMode::Filtered {
                filter,
                accepted_spelling: Some(spelling),
            } => {
                params.push((spelling.to_string(), filter.clone()));
                self.source.fetch_page(&params).await?
            }
            QueryMode::Filtered {
                filter,
                accepted_spelling,
            } => {
                let (spelling, page) = probe_filter_spellings(self.source, &params, filter).await?;
                log::debug!("Filter parameter accepted as '{}'", spelling);
                *accepted_spelling = Some(spelling);
                page
            }
            QueryMode::Unfiltered => self.source.fetch_page(&params).await?,
        };
        self.pages_fetched += 1;

        let records = record_count(&page);
        let next_cursor = extract_next_cursor(&page);
        log::debug!(
            "Page {} fetched: {} records, next cursor: {}",
            self.pages_fetched,
            records,
            if next_cursor.is_some() { "yes" } else { "no" }
        );

        if records == 0 {
            self.finished = true;
            return Ok(None);
        }

        match next_cursor {
            Some(next) if self.cursor.as_deref() == Some(next.as_str()) => {
                log::warn!("Server returned the same cursor twice, ending pagination");
                self.finished = true;
            }
            Some(next) => self.cursor = Some(next),
            None => self.finished = true,
        }

        Ok(Some(page))
    }

    /// Drain the stream into a list of raw page payloads
    pub async fn fetch_all(mut self) -> Result<Vec<Value>, FetchError> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await? {
            pages.push(page);
        }
        Ok(pages)
    }
}

async fn probe_filter_spellings<S: PageSource + ?Sized>(
    source: &S,
    params: &[(String, String)],
    filter: &str,
) -> Result<(&'static str, Value), FetchError> {
    let mut last_error = None;

    for spelling in FILTER_PARAM_SPELLINGS {
        let mut attempt = params.to_vec();
        attempt.push((spelling.to_string(), filter.to_string()));

        match source.fetch_page(&attempt).await {
            Ok(page) => return Ok((spelling, page)),
            Err(e) => {
                log::warn!("Filter parameter '{}' rejected: {}", spelling, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| FetchError::RemoteFetchFailed {
        status: None,
        message: "no filter parameter spelling was accepted".to_string(),
    }))
}

pub fn record_count(page: &Value) -> usize {
    page.get("data").and_then(Value::as_array).map_or(0, Vec::len)
}

/// Resolve the next-page cursor from `links.next`
///
/// Accepts a plain string or an object with `href`; full or relative URLs
/// are unwrapped to the bare `page[cursor]` token.
pub fn extract_next_cursor(page: &Value) -> Option<String> {
    let next = page.get("links")?.get("next")?;

    let raw = match next {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("href")?.as_str()?,
        _ => return None,
    };

    unwrap_cursor(raw)
}

/// Bare cursor token from either a token or a URL embedding `page[cursor]`
pub fn unwrap_cursor(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let looks_like_link = raw.contains('?')
        || raw.contains("://")
        || raw.contains("page[cursor]=")
        || raw.contains("page%5Bcursor%5D=");
    if !looks_like_link {
        return Some(raw.to_string());
    }

    let url = Url::parse(raw)
        .or_else(|_| Url::parse(RELATIVE_LINK_BASE).and_then(|base| base.join(raw)))
        .ok()?;

    let token = url
        .query_pairs()
        .find(|(key, _)| key == CURSOR_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());

    if token.is_none() {
        log::warn!("Next link carries no {} parameter: {}", CURSOR_PARAM, raw);
    }
    token
}
