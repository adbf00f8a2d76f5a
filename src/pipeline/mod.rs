// src/pipeline/mod.rs

//! Transform tasks.
//!
//! Every asset category is one task: it reads the matching files from its
//! source sub-directory, produces [`OutputFile`]s in memory, and only when all
//! inputs transformed successfully writes them under the output root. The
//! clean task is the single root every transform task runs after.
//!
//! - [`catalog`] lists the tasks and their dependencies.
//! - [`source`] finds the input files of a category.
//! - one module per category does the actual transformation.

pub mod bundle;
pub mod catalog;
pub mod clean;
pub mod copy;
pub mod images;
pub mod include;
pub mod scripts;
pub mod source;
pub mod sourcemap;
pub mod styles;
pub mod views;

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::BuildContext;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::{ReloadKind, ReloadNotice};

/// One asset category, i.e. one transform task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Views,
    Styles,
    Scripts,
    Images,
    Fonts,
    Metadata,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Views,
        AssetKind::Styles,
        AssetKind::Scripts,
        AssetKind::Images,
        AssetKind::Fonts,
        AssetKind::Metadata,
    ];

    /// Task name, which doubles as the source sub-directory name.
    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Views => "views",
            AssetKind::Styles => "styles",
            AssetKind::Scripts => "scripts",
            AssetKind::Images => "images",
            AssetKind::Fonts => "fonts",
            AssetKind::Metadata => "metadata",
        }
    }

    /// File extensions the category picks up.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            AssetKind::Views => &["html"],
            AssetKind::Styles => &["scss"],
            AssetKind::Scripts => &["js"],
            AssetKind::Images => &["jpg", "jpeg", "gif", "png"],
            AssetKind::Fonts => &["ttf", "eot", "woff", "woff2"],
            AssetKind::Metadata => &["json"],
        }
    }

    /// Destination directory relative to the output root.
    pub fn output_dir(self) -> &'static str {
        match self {
            AssetKind::Views => "",
            AssetKind::Styles => "assets/css",
            AssetKind::Scripts => "assets/js",
            AssetKind::Images => "assets/images",
            AssetKind::Fonts => "assets/fonts",
            AssetKind::Metadata => "assets/metadata",
        }
    }

    /// Glob for the file names of one directory level, e.g. `*.{ttf,woff}`.
    pub fn file_glob(self) -> String {
        match self.extensions() {
            [single] => format!("*.{single}"),
            many => format!("*.{{{}}}", many.join(",")),
        }
    }

    /// Recursive watch glob relative to the source root, e.g.
    /// `styles/**/*.scss`.
    pub fn watch_glob(self) -> String {
        format!("{}/**/{}", self.name(), self.file_glob())
    }

    pub fn reload_kind(self) -> ReloadKind {
        match self {
            AssetKind::Styles => ReloadKind::Css,
            _ => ReloadKind::Full,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a task does when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Clean,
    Asset(AssetKind),
}

/// A transformed file held in memory until its task commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to the output root.
    pub rel_path: PathBuf,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(rel_path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            rel_path: rel_path.into(),
            bytes: bytes.into(),
        }
    }

    /// `rel_path` with forward slashes, as served over HTTP.
    pub fn url_path(&self) -> String {
        self.rel_path.to_string_lossy().replace('\\', "/")
    }
}

/// Run one task to completion.
///
/// Returns the reload notice for the written files, or `None` when nothing
/// was written (clean, or zero matching inputs).
pub fn run_task(
    name: &str,
    kind: TaskKind,
    ctx: &BuildContext,
    fs: &dyn FileSystem,
) -> Result<Option<ReloadNotice>> {
    match kind {
        TaskKind::Clean => {
            clean::run(ctx, fs)?;
            Ok(None)
        }
        TaskKind::Asset(asset) => {
            let outputs = transform(asset, ctx, fs)?;
            if outputs.is_empty() {
                debug!(task = %name, "no matching inputs; nothing written");
                return Ok(None);
            }

            let paths = commit(&outputs, ctx, fs)?;
            info!(task = %name, files = paths.len(), mode = %ctx.mode, "task wrote outputs");

            Ok(Some(ReloadNotice {
                task: name.to_string(),
                kind: asset.reload_kind(),
                paths,
            }))
        }
    }
}

/// Produce every output of a category without touching the output root.
pub fn transform(
    asset: AssetKind,
    ctx: &BuildContext,
    fs: &dyn FileSystem,
) -> Result<Vec<OutputFile>> {
    match asset {
        AssetKind::Views => views::transform(ctx, fs),
        AssetKind::Styles => styles::transform(ctx, fs),
        AssetKind::Scripts => scripts::transform(ctx, fs),
        AssetKind::Images => images::transform(ctx, fs),
        AssetKind::Fonts | AssetKind::Metadata => copy::transform(asset, ctx, fs),
    }
}

fn commit(outputs: &[OutputFile], ctx: &BuildContext, fs: &dyn FileSystem) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(outputs.len());
    for file in outputs {
        let dest = ctx.paths.output_root.join(&file.rel_path);
        debug!(path = ?dest, bytes = file.bytes.len(), "writing output");
        fs.write(&dest, &file.bytes)?;
        written.push(file.url_path());
    }
    Ok(written)
}
