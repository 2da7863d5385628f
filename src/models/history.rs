use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of the last scan of a target, keyed by the same identity key as the
/// target pool but persisted independently. Stale entries for removed targets
/// are harmless and never pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanHistoryEntry {
    pub timestamp: DateTime<Utc>,
    /// Opaque correlation id from the external agent run, if any.
    pub session_id: Option<String>,
}
