// src/watch/hash.rs

//! Content hashing for `[watch] use_hash = true`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use blake3::Hasher;
use tracing::debug;

use crate::engine::TaskName;
use crate::fs::FileSystem;

/// Hash of a single file's contents.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs.read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Aggregate hash over per-file hashes.
///
/// `hashes` must be ordered by the corresponding file path to keep the
/// result stable.
pub fn compute_aggregate_hash(hashes: &[String]) -> String {
    let mut hasher = Hasher::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Last seen aggregate hash per task.
pub trait HashStore: Send + Sync {
    fn load(&self, task: &str) -> Option<String>;
    fn save(&mut self, task: &str, hash: &str);
}

/// Process-lifetime [`HashStore`]; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<TaskName, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, task: &str) -> Option<String> {
        self.map.get(task).cloned()
    }

    fn save(&mut self, task: &str, hash: &str) {
        debug!(task = %task, hash = %hash, "stored task hash");
        self.map.insert(task.to_string(), hash.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn aggregate_depends_on_order_and_content() {
        let a = "a".to_string();
        let b = "b".to_string();
        assert_eq!(
            compute_aggregate_hash(&[a.clone(), b.clone()]),
            compute_aggregate_hash(&[a.clone(), b.clone()])
        );
        assert_ne!(
            compute_aggregate_hash(&[a.clone(), b.clone()]),
            compute_aggregate_hash(&[b, a])
        );
    }

    #[test]
    fn file_hash_tracks_content() {
        let fs = MockFileSystem::new();
        fs.add_file("/s/a.scss", "a {}");
        let first = compute_file_hash(&fs, Path::new("/s/a.scss")).unwrap();
        fs.add_file("/s/a.scss", "b {}");
        assert_ne!(first, compute_file_hash(&fs, Path::new("/s/a.scss")).unwrap());
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryHashStore::new();
        assert_eq!(store.load("styles"), None);
        store.save("styles", "abc");
        assert_eq!(store.load("styles").as_deref(), Some("abc"));
    }
}
