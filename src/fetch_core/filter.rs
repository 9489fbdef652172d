//! Query-language filter for the hacktivity endpoint
//!
//! Lucene-style grammar: `field:[S TO E)` is a closed-open range and
//! `field:>0` a strict lower bound. Dates are plain `YYYY-MM-DD`; the
//! API interprets them as UTC.

use super::window::TimeWindow;

pub const ACTION_FIELD: &str = "latest_disclosable_action";
pub const BOUNTY_AWARDED_ACTION: &str = "Activities::BountyAwarded";
pub const ACTIVITY_FIELD: &str = "latest_disclosable_activity_at";
pub const AMOUNT_FIELD: &str = "total_awarded_amount";

/// Records awarded a bounty inside `[start, end)` with a positive amount
pub fn build_filter(window: &TimeWindow) -> String {
    let start = window.start.format("%Y-%m-%d");
    let end = window.end.format("%Y-%m-%d");

    format!(
        "{}:{} {}:[{} TO {}) {}:>0",
        ACTION_FIELD, BOUNTY_AWARDED_ACTION, ACTIVITY_FIELD, start, end, AMOUNT_FIELD
    )
}
