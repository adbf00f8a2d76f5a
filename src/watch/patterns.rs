// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::pipeline::catalog::TaskDef;

/// Compiled watch glob for a single task.
///
/// Patterns are relative to the source root; the watcher passes relative
/// paths (e.g. `"styles/base/_vars.scss"`) into `matches`.
#[derive(Clone)]
pub struct TaskWatchProfile {
    name: TaskName,
    patterns: Vec<String>,
    watch_set: GlobSet,
    use_hash: bool,
}

impl fmt::Debug for TaskWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWatchProfile")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl TaskWatchProfile {
    /// Compile a profile for `name` from source-root-relative globs.
    pub fn new(name: impl Into<TaskName>, patterns: Vec<String>, use_hash: bool) -> Result<Self> {
        let name = name.into();
        let watch_set = build_globset(&patterns)
            .with_context(|| format!("building watch globset for task {name}"))?;
        Ok(Self {
            name,
            patterns,
            watch_set,
            use_hash,
        })
    }

    /// Name of the task this profile belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether triggers are filtered by content hash.
    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Returns true if this task is interested in `rel_path`, a path relative
    /// to the source root with forward slashes.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.watch_set.is_match(rel_path)
    }
}

/// One profile per task that declares a `watch` glob.
pub fn build_task_watch_profiles(defs: &[TaskDef], use_hash: bool) -> Result<Vec<TaskWatchProfile>> {
    defs.iter()
        .filter_map(|def| def.watch.as_ref().map(|glob| (def, glob)))
        .map(|(def, glob)| TaskWatchProfile::new(def.name.clone(), vec![glob.clone()], use_hash))
        .collect()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// All files under `root` that the profile matches, sorted.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    profile: &TaskWatchProfile,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !fs.is_dir(root) {
        return Ok(files);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(root) {
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                if profile.matches(&rel_str) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::pipeline::catalog::task_catalog;

    fn profile(profiles: &[TaskWatchProfile], name: &str) -> TaskWatchProfile {
        profiles.iter().find(|p| p.name() == name).unwrap().clone()
    }

    #[test]
    fn every_asset_task_gets_a_recursive_binding() {
        let profiles = build_task_watch_profiles(&task_catalog(&[]), false).unwrap();
        assert_eq!(profiles.len(), 6, "clean has no watch binding");

        let styles = profile(&profiles, "styles");
        assert!(styles.matches("styles/main.scss"));
        assert!(styles.matches("styles/base/_vars.scss"));
        assert!(!styles.matches("styles/main.css"));
        assert!(!styles.matches("views/main.scss"));

        let images = profile(&profiles, "images");
        assert!(images.matches("images/icons/logo.png"));
        assert!(images.matches("images/photo.jpeg"));
        assert!(!images.matches("images/logo.svg"));
    }

    #[test]
    fn collects_nested_matches_in_order() {
        let fs = MockFileSystem::new();
        fs.add_file("/s/src/views/index.html", "");
        fs.add_file("/s/src/views/partials/head.html", "");
        fs.add_file("/s/src/views/notes.md", "");
        fs.add_file("/s/src/styles/a.scss", "");

        let profiles = build_task_watch_profiles(&task_catalog(&[]), true).unwrap();
        let views = profile(&profiles, "views");
        assert!(views.use_hash());

        let files = collect_matching_files(&fs, Path::new("/s/src"), &views).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/s/src/views/index.html"),
                PathBuf::from("/s/src/views/partials/head.html"),
            ]
        );
    }
}
