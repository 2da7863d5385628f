use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::HuntsmanError;
use crate::models::{ScanHistoryEntry, ScanTarget};

const TARGETS_FILE: &str = "targets.json";
const SCANNED_FILE: &str = "scanned.json";

/// Durable state holder for the target pool and the scan-history ledger.
///
/// Load-on-construct, flush-on-mutate: callers mutate the in-memory maps and
/// call `flush` before returning. The two stores persist independently; a
/// target can exist without history and vice versa. Both files are plain
/// JSON, meant to be human-inspectable.
pub struct TargetStore {
    targets_path: PathBuf,
    history_path: PathBuf,
    pub(crate) pool: BTreeMap<String, ScanTarget>,
    pub(crate) history: BTreeMap<String, ScanHistoryEntry>,
}

impl TargetStore {
    /// Open the store under `data_dir`, creating the directory if needed.
    /// Missing files mean an empty store; unreadable files are fatal, since
    /// silently discarding durable state would corrupt future priority and
    /// recency decisions.
    pub fn open(data_dir: &Path) -> Result<Self, HuntsmanError> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| HuntsmanError::Persistence(format!("Cannot create data dir: {e}")))?;

        let targets_path = data_dir.join(TARGETS_FILE);
        let history_path = data_dir.join(SCANNED_FILE);

        let pool = match load_json::<Vec<ScanTarget>>(&targets_path)? {
            Some(targets) => targets.into_iter().map(|t| (t.key(), t)).collect(),
            None => BTreeMap::new(),
        };
        let history = load_json::<BTreeMap<String, ScanHistoryEntry>>(&history_path)?
            .unwrap_or_default();

        debug!(
            targets = pool.len(),
            history = history.len(),
            "Loaded target store"
        );

        Ok(Self {
            targets_path,
            history_path,
            pool,
            history,
        })
    }

    /// Persist both stores. Write failures propagate: losing state silently
    /// is worse than failing the operation.
    pub fn flush(&self) -> Result<(), HuntsmanError> {
        let targets: Vec<&ScanTarget> = self.pool.values().collect();
        write_json(&self.targets_path, &targets)?;
        write_json(&self.history_path, &self.history)?;
        Ok(())
    }

    pub fn pool(&self) -> &BTreeMap<String, ScanTarget> {
        &self.pool
    }

    pub fn history(&self) -> &BTreeMap<String, ScanHistoryEntry> {
        &self.history
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, HuntsmanError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| HuntsmanError::Persistence(format!("Cannot read {}: {e}", path.display())))?;
    let data = serde_json::from_str(&raw)
        .map_err(|e| HuntsmanError::Persistence(format!("Corrupt state in {}: {e}", path.display())))?;
    Ok(Some(data))
}

fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), HuntsmanError> {
    let raw = serde_json::to_string_pretty(data)
        .map_err(|e| HuntsmanError::Persistence(format!("Cannot serialize state: {e}")))?;
    std::fs::write(path, raw)
        .map_err(|e| HuntsmanError::Persistence(format!("Cannot write {}: {e}", path.display())))
}
