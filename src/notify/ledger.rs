use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use crate::errors::HuntsmanError;

const SENT_FILE: &str = "sent_notifications.json";

/// Durable map of finding-hash to the time it was last notified. Load on
/// construct, flush on every mark; the map persists across runs so the
/// dedupe window survives restarts.
pub struct SentLedger {
    path: PathBuf,
    sent: BTreeMap<String, DateTime<Utc>>,
}

impl SentLedger {
    pub fn open(data_dir: &Path) -> Result<Self, HuntsmanError> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| HuntsmanError::Persistence(format!("Cannot create data dir: {e}")))?;

        let path = data_dir.join(SENT_FILE);
        let sent = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| HuntsmanError::Persistence(format!("Cannot read sent ledger: {e}")))?;
            serde_json::from_str(&raw)
                .map_err(|e| HuntsmanError::Persistence(format!("Corrupt sent ledger: {e}")))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, sent })
    }

    /// Was this hash notified within the window ending at `now`?
    pub fn is_duplicate_at(&self, hash: &str, now: DateTime<Utc>, window_hours: i64) -> bool {
        match self.sent.get(hash) {
            Some(sent_at) => now - *sent_at < Duration::hours(window_hours),
            None => false,
        }
    }

    /// Record that this hash was notified. Persists immediately, never
    /// batched: a crash between notify and mark must not replay the window.
    pub fn mark_sent_at(&mut self, hash: &str, at: DateTime<Utc>) -> Result<(), HuntsmanError> {
        self.sent.insert(hash.to_string(), at);
        self.flush()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    fn flush(&self) -> Result<(), HuntsmanError> {
        let raw = serde_json::to_string_pretty(&self.sent)
            .map_err(|e| HuntsmanError::Persistence(format!("Cannot serialize sent ledger: {e}")))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| HuntsmanError::Persistence(format!("Cannot write sent ledger: {e}")))
    }
}
