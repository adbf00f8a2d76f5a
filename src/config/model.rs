// src/config/model.rs

use serde::Deserialize;

use crate::types::TriggerWhileRunningBehaviour;

/// Raw configuration as read from a TOML file (before validation).
///
/// Every section is optional; an empty file (or no file at all) yields the
/// layout of a classic front-end starter:
///
/// ```toml
/// [paths]
/// source = "src"
/// development = "dist"
/// production = "build"
///
/// [server]
/// port = 3000
///
/// [tasks]
/// disabled = ["metadata"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub tasks: TasksSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration.
///
/// Construct via `ConfigFile::try_from(raw)` (see `validate.rs`) or
/// [`ConfigFile::default`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub server: ServerSection,
    pub scripts: ScriptsSection,
    pub styles: StylesSection,
    pub images: ImagesSection,
    pub tasks: TasksSection,
    pub watch: WatchSection,
}

impl ConfigFile {
    /// Wrap a raw config without validating it. Only `validate.rs` should
    /// call this.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            server: raw.server,
            scripts: raw.scripts,
            styles: raw.styles,
            images: raw.images,
            tasks: raw.tasks,
            watch: raw.watch,
        }
    }

    /// Whether the given task is switched off via `[tasks].disabled`.
    pub fn is_disabled(&self, task: &str) -> bool {
        self.tasks.disabled.iter().any(|t| t == task)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[paths]`: source root and the two mode-dependent output roots, all
/// relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_source")]
    pub source: String,

    /// Output root used when `NODE_ENV` is anything but `production`.
    #[serde(default = "default_development")]
    pub development: String,

    /// Output root used when `NODE_ENV=production`.
    #[serde(default = "default_production")]
    pub production: String,
}

fn default_source() -> String {
    "src".to_string()
}

fn default_development() -> String {
    "dist".to_string()
}

fn default_production() -> String {
    "build".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            development: default_development(),
            production: default_production(),
        }
    }
}

/// `[server]`: where the dev server listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[scripts]`: module entry point and bundle naming.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    /// Entry module, relative to `<source>/scripts`.
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Bundle file name written to `assets/js/`.
    #[serde(default = "default_bundle")]
    pub bundle: String,

    /// Global the UMD wrapper assigns the entry's exports to when no module
    /// loader is present.
    #[serde(default = "default_global_name")]
    pub global_name: String,
}

fn default_entry() -> String {
    "index.js".to_string()
}

fn default_bundle() -> String {
    "app.js".to_string()
}

fn default_global_name() -> String {
    "app".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            bundle: default_bundle(),
            global_name: default_global_name(),
        }
    }
}

/// `[styles]`: browsers that production prefixing targets.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    /// Entries of the form `"<browser> <major>[.<minor>]"`, e.g. `"safari 9"`.
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

fn default_targets() -> Vec<String> {
    ["chrome 49", "firefox 52", "safari 9", "ios_saf 9", "edge 15", "ie 11"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            targets: default_targets(),
        }
    }
}

/// `[images]`: production re-encoding settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// `[tasks]`: which asset categories take part in the build.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasksSection {
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// `[watch]`: dev-mode retrigger behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued future runs.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,

    /// Skip a trigger when the task's watched files hash the same as last time.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_queue_length() -> usize {
    1
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
            use_hash: false,
        }
    }
}
