// src/config/env.rs

//! Environment resolution: build mode + concrete paths.
//!
//! Everything a task needs to know about "where" and "how" is resolved here
//! once, at startup, and then handed to every task as a [`BuildContext`].

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, PathsSection};
use crate::types::BuildMode;

/// Source and output roots for the current mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
}

impl PathConfig {
    /// Select the output root for `mode` and anchor both roots at `project_root`.
    pub fn resolve(mode: BuildMode, paths: &PathsSection, project_root: &Path) -> Self {
        let output = match mode {
            BuildMode::Production => &paths.production,
            BuildMode::Development => &paths.development,
        };

        Self {
            source_root: project_root.join(&paths.source),
            output_root: project_root.join(output),
        }
    }

    /// Directory of one source category, e.g. `<source>/styles`.
    pub fn source_dir(&self, category: &str) -> PathBuf {
        self.source_root.join(category)
    }
}

/// Immutable per-process settings threaded into every task invocation.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub mode: BuildMode,
    pub paths: PathConfig,
    pub settings: ConfigFile,
}

impl BuildContext {
    pub fn new(mode: BuildMode, settings: ConfigFile, project_root: &Path) -> Self {
        let paths = PathConfig::resolve(mode, &settings.paths, project_root);
        Self {
            mode,
            paths,
            settings,
        }
    }

    /// Resolve the mode from `NODE_ENV`.
    pub fn from_env(settings: ConfigFile, project_root: &Path) -> Self {
        Self::new(BuildMode::from_env(), settings, project_root)
    }
}
