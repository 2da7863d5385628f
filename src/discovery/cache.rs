use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// On-disk fallback for raw provider payloads. One snapshot per provider,
/// overwritten on each successful fetch. Reads and writes are best-effort;
/// a missing or unreadable snapshot is simply a cache miss.
pub struct ProviderCache {
    dir: PathBuf,
}

impl ProviderCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.dir.join(name);
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(data) => {
                debug!(cache = name, "Loaded provider snapshot from cache");
                Some(data)
            }
            Err(e) => {
                warn!(cache = name, error = %e, "Ignoring corrupt cache snapshot");
                None
            }
        }
    }

    pub fn store<T: Serialize>(&self, name: &str, data: &T) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(error = %e, "Failed to create cache directory");
            return;
        }
        let path = self.dir.join(name);
        match serde_json::to_string_pretty(data) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&path, raw) {
                    warn!(cache = name, error = %e, "Failed to write cache snapshot");
                }
            }
            Err(e) => warn!(cache = name, error = %e, "Failed to serialize cache snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProviderCache::new(dir.path().to_path_buf());

        cache.store("snapshot.json", &vec![1u32, 2, 3]);
        let loaded: Option<Vec<u32>> = cache.load("snapshot.json");
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_cache_miss_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProviderCache::new(dir.path().to_path_buf());
        let loaded: Option<Vec<u32>> = cache.load("absent.json");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_cache_corrupt_snapshot_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let cache = ProviderCache::new(dir.path().to_path_buf());
        let loaded: Option<Vec<u32>> = cache.load("bad.json");
        assert!(loaded.is_none());
    }
}
