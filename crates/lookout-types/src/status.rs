use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a scan session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    Connecting,
    Scanning,
    Finished,
    Failed,
}

/// Pull-based snapshot of one tenant's scan session, served to the status
/// endpoint of the web layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatus {
    pub running: bool,
    pub phase: ScanPhase,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub messages_scanned: u64,
    pub matches_found: u64,
}
