use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Entity name used when no program/team name can be resolved
pub const UNKNOWN_PROGRAM: &str = "Unknown Program";

/// One disclosed award event attributed to a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Remote node id, empty when the node had none
    pub id: String,
    pub program: String,
    #[serde(rename = "total_awarded_amount")]
    pub amount: Decimal,
    pub activity_at: DateTime<Utc>,
}
