//! Payout Window Binary - bounty totals per program over trailing months
//!
//! Each month runs the full fetch/fallback pipeline on a bounded worker pool;
//! a month whose remote fetch fails is retried with exponential backoff.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin payout_window -- --end-month 2025-08 --months 6
//! ```
//!
//! ## Flags
//!
//! - `--end-month YYYY-MM` - last month, inclusive (default: current UTC month)
//! - `--months N` - window length (default: 6)
//! - `--top N` - rows printed to stdout (default: 10)
//! - `--backend jsonl|sqlite` - aggregate output backend (default: jsonl)
//!
//! ## Environment Variables
//!
//! Same as `payout_month`, plus:
//! - PAYOUT_WORKERS - concurrent months (default: 3)
//! - PAYOUT_MAX_RETRIES - retries per month (default: 3)

use payoutflow::config::{arg_value, parse_backend_from_args, FetchConfig};
use payoutflow::fetch_core::{month_range, HacktivityClient};
use payoutflow::persistence::{save_snapshot, OutputLayout};
use payoutflow::pipeline::{MonthScheduler, PayoutPipeline};
use payoutflow::report_core::{render_top_rows, ReportWriter};
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let backend = parse_backend_from_args(&args);
    let end_month = arg_value(&args, "--end-month")
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m").to_string());
    let count: usize = arg_value(&args, "--months")
        .and_then(|s| s.parse().ok())
        .unwrap_or(6);
    let top: usize = arg_value(&args, "--top")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let config = FetchConfig::from_env()?;
    let months = month_range(&end_month, count)?;

    let (first, last) = match (months.first(), months.last()) {
        (Some(first), Some(last)) => (first.clone(), last.clone()),
        _ => {
            println!("No months requested");
            return Ok(());
        }
    };
    let label = format!("{}..{}", first, last);

    log::info!("🚀 Starting payout window report");
    log::info!("   Months: {} ({})", label, months.len());
    log::info!("   Workers: {}", config.workers);
    log::info!("   Max retries per month: {}", config.max_retries);
    log::info!("   Backend: {:?}", backend);

    let client = HacktivityClient::new(
        config.api_url.clone(),
        config.credentials.clone(),
        config.request_timeout,
    )?;
    let pipeline = PayoutPipeline::from_config(Arc::new(client), &config);
    let scheduler = MonthScheduler::new(pipeline, config.workers).with_retries(
        config.max_retries,
        Duration::from_secs(2),
        Duration::from_secs(30),
    );

    let window = match scheduler.run(&months).await {
        Ok(window) => window,
        Err(e) => {
            log::error!("❌ Payout window {} failed: {}", label, e);
            return Err(e.into());
        }
    };

    for month in &window.months {
        log::info!(
            "   {}: {} records via {} fetch",
            month.month,
            month.records.len(),
            month.source.as_str()
        );
    }

    let records: Vec<_> = window
        .months
        .iter()
        .flat_map(|m| m.records.iter().cloned())
        .collect();

    let layout = OutputLayout::new(&config.output_dir, &label, &backend);
    save_snapshot(&label, &records, &layout.raw_path)?;
    log::info!("💾 Raw records: {}", layout.raw_path.display());

    let mut writer = ReportWriter::new(backend, layout.aggregate_path.clone())?;
    writer.write_rows(&label, &window.rows).await?;
    writer.flush().await?;
    log::info!("💾 {} aggregate: {}", writer.backend_type(), writer.location().display());

    if window.rows.is_empty() {
        println!("No bounty data for {}", label);
        return Ok(());
    }

    println!(
        "Top {} programs by bounty total for {} ({} reports):",
        top.min(window.rows.len()),
        label,
        window.record_count()
    );
    for line in render_top_rows(&window.rows, top) {
        println!("{}", line);
    }

    Ok(())
}
