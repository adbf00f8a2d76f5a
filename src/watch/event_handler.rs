// src/watch/event_handler.rs

//! Turns one changed path into task triggers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::hash::{compute_aggregate_hash, HashStore, MemoryHashStore};
use crate::watch::patterns::{collect_matching_files, TaskWatchProfile};

/// Matches changed paths against the watch bindings and publishes
/// `TaskTriggered` events on the runtime channel.
#[derive(Debug, Clone)]
pub struct ChangeDispatcher {
    root: PathBuf,
    profiles: Arc<Vec<TaskWatchProfile>>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    hashing: Arc<HashFilter>,
}

impl ChangeDispatcher {
    /// `root` is the source root all watch globs are relative to.
    pub fn new(
        root: impl Into<PathBuf>,
        profiles: Vec<TaskWatchProfile>,
        fs: Arc<dyn FileSystem>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            root: root.into(),
            profiles: Arc::new(profiles),
            runtime_tx,
            hashing: Arc::new(HashFilter::new(fs)),
        }
    }

    /// Trigger every task bound to `path`.
    ///
    /// Returns `false` once the runtime channel is closed.
    pub async fn process_file_change(&self, path: &Path) -> bool {
        let Some(rel_str) = relative_str(&self.root, path) else {
            warn!(path = ?path, root = ?self.root, "could not relativize event path");
            return true;
        };

        for profile in self.profiles.iter().filter(|p| p.matches(&rel_str)) {
            if profile.use_hash() && !self.content_changed(profile, path).await {
                info!(task = %profile.name(), path = %rel_str, "watched content unchanged; skipping trigger");
                continue;
            }

            debug!(task = %profile.name(), path = %rel_str, "watch match -> triggering task");
            let event = RuntimeEvent::TaskTriggered {
                task: profile.name().to_string(),
                reason: TriggerReason::FileWatch,
            };
            if self.runtime_tx.send(event).await.is_err() {
                warn!("runtime channel closed; stopping change dispatch");
                return false;
            }
        }

        true
    }

    async fn content_changed(&self, profile: &TaskWatchProfile, changed: &Path) -> bool {
        let hashing = Arc::clone(&self.hashing);
        let root = self.root.clone();
        let profile = profile.clone();
        let changed = changed.to_path_buf();

        tokio::task::spawn_blocking(move || hashing.content_changed(&root, &profile, &changed))
            .await
            .unwrap_or(true)
    }
}

/// Remembers the aggregate hash of each task's watched files.
#[derive(Debug)]
struct HashFilter {
    fs: Arc<dyn FileSystem>,
    cache: Mutex<FileCache>,
    store: Mutex<MemoryHashStore>,
}

impl HashFilter {
    fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cache: Mutex::new(FileCache::new()),
            store: Mutex::new(MemoryHashStore::new()),
        }
    }

    /// Whether the task's watched files differ from the last time this was
    /// asked. Any error counts as a change.
    fn content_changed(&self, root: &Path, profile: &TaskWatchProfile, changed: &Path) -> bool {
        let task = profile.name();

        let files = match collect_matching_files(self.fs.as_ref(), root, profile) {
            Ok(files) => files,
            Err(err) => {
                warn!(task = %task, error = %err, "failed to collect watched files; triggering anyway");
                return true;
            }
        };

        let hashes = {
            let Ok(mut cache) = self.cache.lock() else {
                warn!("file cache mutex poisoned; triggering anyway");
                return true;
            };
            cache.invalidate(changed);

            let mut hashes = Vec::with_capacity(files.len() * 2);
            for file in &files {
                match cache.get_or_compute(self.fs.as_ref(), file) {
                    Ok(hash) => {
                        // Renames change the aggregate too.
                        hashes.push(file.to_string_lossy().into_owned());
                        hashes.push(hash);
                    }
                    Err(err) => {
                        warn!(task = %task, file = ?file, error = %err, "failed to hash file; triggering anyway");
                        return true;
                    }
                }
            }
            hashes
        };

        let new_hash = compute_aggregate_hash(&hashes);

        let Ok(mut store) = self.store.lock() else {
            warn!(task = %task, "hash store mutex poisoned; triggering anyway");
            return true;
        };
        if store.load(task).as_deref() == Some(new_hash.as_str()) {
            return false;
        }
        store.save(task, &new_hash);
        true
    }
}

/// `path` relative to `root` with forward slashes.
///
/// Falls back to canonicalised paths when the plain prefix does not match
/// (symlinked temp dirs on macOS).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    path.strip_prefix(&root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::pipeline::catalog::task_catalog;
    use crate::watch::patterns::build_task_watch_profiles;

    fn dispatcher(fs: &MockFileSystem, use_hash: bool) -> (ChangeDispatcher, mpsc::Receiver<RuntimeEvent>) {
        let profiles = build_task_watch_profiles(&task_catalog(&[]), use_hash).unwrap();
        let (tx, rx) = mpsc::channel(16);
        let dispatcher = ChangeDispatcher::new("/site/src", profiles, Arc::new(fs.clone()), tx);
        (dispatcher, rx)
    }

    fn triggered(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let RuntimeEvent::TaskTriggered { task, reason } = event {
                assert_eq!(reason, TriggerReason::FileWatch);
                out.push(task);
            }
        }
        out
    }

    #[tokio::test]
    async fn partial_change_triggers_its_category() {
        let fs = MockFileSystem::new();
        let (dispatcher, mut rx) = dispatcher(&fs, false);

        assert!(dispatcher.process_file_change(Path::new("/site/src/styles/base/_vars.scss")).await);
        assert!(dispatcher.process_file_change(Path::new("/site/src/views/partials/nav.html")).await);
        assert!(dispatcher.process_file_change(Path::new("/site/src/README.md")).await);
        assert!(dispatcher.process_file_change(Path::new("/elsewhere/styles/a.scss")).await);

        assert_eq!(triggered(&mut rx), vec!["styles", "views"]);
    }

    #[tokio::test]
    async fn unchanged_content_is_skipped_with_use_hash() {
        let fs = MockFileSystem::new();
        let path = Path::new("/site/src/scripts/index.js");
        fs.add_file(path, "export const a = 1;");
        let (dispatcher, mut rx) = dispatcher(&fs, true);

        dispatcher.process_file_change(path).await;
        dispatcher.process_file_change(path).await;
        assert_eq!(triggered(&mut rx), vec!["scripts"]);

        fs.add_file(path, "export const a = 2;");
        dispatcher.process_file_change(path).await;
        assert_eq!(triggered(&mut rx), vec!["scripts"]);
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        assert_eq!(
            relative_str(Path::new("/site/src"), Path::new("/site/src/images/a.png")).as_deref(),
            Some("images/a.png")
        );
        assert_eq!(relative_str(Path::new("/site/src"), Path::new("/nope/x")), None);
    }
}
