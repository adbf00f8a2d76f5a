use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sitepipe::config::{BuildContext, ConfigFile};
use sitepipe::fs::{FileSystem, RealFileSystem};
use sitepipe::types::BuildMode;
use tempfile::TempDir;

/// A throwaway project directory laid out like a real site.
pub struct TestSite {
    dir: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating parent dir");
        }
        fs::write(&path, contents).expect("writing site file");
        self
    }

    pub fn remove(&self, rel: &str) -> &Self {
        fs::remove_file(self.root().join(rel)).expect("removing site file");
        self
    }

    pub fn context(&self, mode: BuildMode, settings: ConfigFile) -> Arc<BuildContext> {
        Arc::new(BuildContext::new(mode, settings, self.root()))
    }

    pub fn real_fs(&self) -> Arc<dyn FileSystem> {
        Arc::new(RealFileSystem)
    }

    /// Contents of an output file as text.
    pub fn read_output(&self, ctx: &BuildContext, rel: &str) -> String {
        fs::read_to_string(ctx.paths.output_root.join(rel))
            .unwrap_or_else(|e| panic!("reading output {rel}: {e}"))
    }

    /// Every file below the output root, relative and with forward slashes.
    pub fn output_files(&self, ctx: &BuildContext) -> Vec<String> {
        let root = &ctx.paths.output_root;
        let mut files = Vec::new();
        collect(root, &mut files);
        let mut rel: Vec<String> = files
            .iter()
            .filter_map(|p| p.strip_prefix(root).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        rel.sort();
        rel
    }
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

fn collect(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
        } else {
            out.push(path);
        }
    }
}
