use {
    crate::{config::BackendType, fetch_core::ActivityRecord},
    serde::{Deserialize, Serialize},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Where one run's raw archive and aggregate table go
///
/// `<root>/tool_outputs/payouts_<label>_<ts>_raw.json` for raw records, and
/// either `<root>/findings/payouts_<label>_<ts>_agg.jsonl` or the shared
/// `<root>/payoutflow.db` for the aggregate table.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub raw_path: PathBuf,
    pub aggregate_path: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path, label: &str, backend: &BackendType) -> Self {
        let ts = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
        let base = format!("payouts_{}_{}", label.replace("..", "_to_"), ts);

        let aggregate_path = match backend {
            BackendType::Jsonl => root.join("findings").join(format!("{}_agg.jsonl", base)),
            BackendType::Sqlite => root.join("payoutflow.db"),
        };

        Self {
            raw_path: root.join("tool_outputs").join(format!("{}_raw.json", base)),
            aggregate_path,
        }
    }
}

/// Raw archive of one run's records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub label: String,
    pub records: Vec<ActivityRecord>,
    pub timestamp: i64,
}

/// Save records to a pretty-printed JSON file, creating parent directories
pub fn save_snapshot(
    label: &str,
    records: &[ActivityRecord],
    file_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let snapshot = RecordSnapshot {
        label: label.to_string(),
        records: records.to_vec(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    let json = serde_json::to_string_pretty(&snapshot)?;
    fs::write(file_path, json)?;

    log::debug!("Saved {} records to {}", records.len(), file_path.display());
    Ok(())
}

/// Load a snapshot written by `save_snapshot`
pub fn load_snapshot(file_path: &Path) -> Result<RecordSnapshot, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(file_path)?;
    let snapshot: RecordSnapshot = serde_json::from_str(&json)?;

    log::info!("Loaded {} records from {}", snapshot.records.len(), file_path.display());
    Ok(snapshot)
}
