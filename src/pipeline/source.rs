// src/pipeline/source.rs

//! Input discovery for a category: one directory level, matched by file name.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};

use crate::fs::FileSystem;

/// Compile a file-name glob such as `*.{jpg,png}`.
pub fn file_matcher(pattern: &str) -> Result<GlobMatcher> {
    let glob = Glob::new(pattern).with_context(|| format!("invalid glob: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Files directly inside `dir` whose names match `matcher`, sorted.
///
/// A missing directory yields no files.
pub fn matching_files(
    fs: &dyn FileSystem,
    dir: &Path,
    matcher: &GlobMatcher,
) -> Result<Vec<PathBuf>> {
    if !fs.is_dir(dir) {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs
        .read_dir(dir)?
        .into_iter()
        .filter(|path| fs.is_file(path))
        .filter(|path| path.file_name().is_some_and(|name| matcher.is_match(name)))
        .collect();

    files.sort();
    Ok(files)
}

/// File name of `path` as UTF-8, falling back to a lossy conversion.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lexically resolve `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
