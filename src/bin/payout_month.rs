//! Payout Month Binary - bounty totals per program for one calendar month
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin payout_month -- --month 2025-08 --top 10 --backend jsonl
//! ```
//!
//! ## Flags
//!
//! - `--month YYYY-MM` (default: current UTC month)
//! - `--top N` - rows printed to stdout (default: 10)
//! - `--backend jsonl|sqlite` - aggregate output backend (default: jsonl)
//!
//! ## Environment Variables
//!
//! - H1_USERNAME, H1_API_TOKEN - API credentials (required)
//! - H1_API_URL, H1_PAGE_SIZE, H1_MAX_PAGES, H1_REQUEST_TIMEOUT_SECS
//! - PAYOUT_OUTPUT_DIR - root for raw snapshots and aggregates (default: logs)
//! - RUST_LOG - Logging level (optional, default: info)

use payoutflow::config::{arg_value, parse_backend_from_args, FetchConfig};
use payoutflow::fetch_core::HacktivityClient;
use payoutflow::persistence::{save_snapshot, OutputLayout};
use payoutflow::pipeline::PayoutPipeline;
use payoutflow::report_core::{render_top_rows, ReportWriter};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let backend = parse_backend_from_args(&args);
    let month = arg_value(&args, "--month")
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m").to_string());
    let top: usize = arg_value(&args, "--top")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let config = FetchConfig::from_env()?;

    log::info!("🚀 Starting payout report");
    log::info!("   Month: {}", month);
    log::info!("   Endpoint: {}", config.api_url);
    log::info!("   Backend: {:?}", backend);
    log::info!("   Output root: {}", config.output_dir.display());

    let client = HacktivityClient::new(
        config.api_url.clone(),
        config.credentials.clone(),
        config.request_timeout,
    )?;
    let pipeline = PayoutPipeline::from_config(Arc::new(client), &config);

    let report = match pipeline.run_month(&month).await {
        Ok(report) => report,
        Err(e) => {
            log::error!("❌ Payout fetch failed for {}: {}", month, e);
            return Err(e.into());
        }
    };

    let layout = OutputLayout::new(&config.output_dir, &report.month, &backend);
    save_snapshot(&report.month, &report.records, &layout.raw_path)?;
    log::info!("💾 Raw records: {}", layout.raw_path.display());

    let mut writer = ReportWriter::new(backend, layout.aggregate_path.clone())?;
    writer.write_rows(&report.month, &report.rows).await?;
    writer.flush().await?;
    log::info!("💾 {} aggregate: {}", writer.backend_type(), writer.location().display());

    if report.is_empty() {
        println!("No bounty data for {}", report.month);
        return Ok(());
    }

    println!("Top {} programs by bounty total for {}:", top.min(report.rows.len()), report.month);
    for line in render_top_rows(&report.rows, top) {
        println!("{}", line);
    }

    Ok(())
}
