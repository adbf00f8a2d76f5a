use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the environment variable that selects the build mode.
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Production/development toggle governing which transform steps run.
///
/// Resolved once at startup and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    Production,
    Development,
}

impl BuildMode {
    /// Only the exact string `"production"` selects production; anything
    /// else, including an unset variable, is development.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => BuildMode::Production,
            _ => BuildMode::Development,
        }
    }

    /// Read [`MODE_ENV_VAR`] from the process environment.
    pub fn from_env() -> Self {
        let value = std::env::var(MODE_ENV_VAR).ok();
        Self::from_env_value(value.as_deref())
    }

    pub fn is_prod(self) -> bool {
        self == BuildMode::Production
    }

    pub fn is_dev(self) -> bool {
        self == BuildMode::Development
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Production => f.write_str("production"),
            BuildMode::Development => f.write_str("development"),
        }
    }
}

/// Behaviour when a task is triggered again while it is part of the active run.
///
/// - `Queue`: remember the trigger and start a new run when the current one
///   finishes (default behaviour).
/// - `Cancel`: drop any previously queued batch and only keep the latest
///   trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    Queue,
    Cancel,
}

impl Default for TriggerWhileRunningBehaviour {
    fn default() -> Self {
        TriggerWhileRunningBehaviour::Queue
    }
}

/// How a connected browser should react to a rebuilt task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    /// Swap stylesheets in place.
    Css,
    /// Reload the whole page.
    Full,
}

/// Pushed to the dev server after a transform task wrote its outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadNotice {
    pub task: String,
    pub kind: ReloadKind,
    /// Written files, relative to the output root, with forward slashes.
    pub paths: Vec<String>,
}
