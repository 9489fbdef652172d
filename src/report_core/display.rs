//! Console rendering of the top payout rows

use crate::aggregator::AggregationRow;
use rust_decimal::{Decimal, RoundingStrategy};

/// `$1,234.56` style amount
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, cents)
}

/// One line per row: rank, program, formatted total, report count
pub fn render_top_rows(rows: &[AggregationRow], top: usize) -> Vec<String> {
    rows.iter()
        .take(top)
        .enumerate()
        .map(|(idx, row)| {
            format!(
                "{:>2}. {}  |  {}  |  reports: {}",
                idx + 1,
                row.program,
                format_usd(row.total_amount),
                row.report_count
            )
        })
        .collect()
}
