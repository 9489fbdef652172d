//! Calendar-month reporting windows
//!
//! A month token `YYYY-MM` maps to the half-open UTC interval
//! `[first day 00:00, first day of next month 00:00)`.

use super::error::FetchError;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// Half-open UTC interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns `None` unless `start < end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Build the window for a `YYYY-MM` token
    pub fn for_month(token: &str) -> Result<Self, FetchError> {
        let (year, month) = parse_month_token(token)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };

        let start = month_start(year, month)
            .ok_or_else(|| FetchError::InvalidWindowToken(token.to_string()))?;
        let end = month_start(next_year, next_month)
            .ok_or_else(|| FetchError::InvalidWindowToken(token.to_string()))?;

        Ok(Self { start, end })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// `YYYY-MM` label of the month the window starts in
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month())
    }
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

fn parse_month_token(token: &str) -> Result<(i32, u32), FetchError> {
    let invalid = || FetchError::InvalidWindowToken(token.to_string());

    let (year_part, month_part) = token.trim().split_once('-').ok_or_else(invalid)?;

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if year_part.len() != 4 || !digits(year_part) {
        return Err(invalid());
    }
    if month_part.len() > 2 || !digits(month_part) {
        return Err(invalid());
    }

    let year: i32 = year_part.parse().map_err(|_| invalid())?;
    let month: u32 = month_part.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    Ok((year, month))
}

/// The `count` month tokens ending at `end_month` (inclusive), oldest first
pub fn month_range(end_month: &str, count: usize) -> Result<Vec<String>, FetchError> {
    let (mut year, mut month) = parse_month_token(end_month)?;

    let mut months = Vec::with_capacity(count);
    for _ in 0..count {
        months.push(format!("{:04}-{:02}", year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    months.reverse();

    Ok(months)
}
