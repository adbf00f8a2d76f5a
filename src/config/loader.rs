// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SitepipeError};

/// File name looked up in the current directory when `--config` is omitted.
pub const DEFAULT_CONFIG_FILE: &str = "Sitepipe.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the config the CLI asked for.
///
/// - An explicit path must exist.
/// - Without one, `Sitepipe.toml` is used when present; otherwise the
///   built-in defaults apply.
///
/// Returns the config together with the project root all relative paths are
/// anchored at (the directory containing the config file).
pub fn resolve_config(explicit: Option<&str>) -> Result<(ConfigFile, PathBuf)> {
    match explicit {
        Some(path) => {
            let path = PathBuf::from(path);
            if !path.is_file() {
                return Err(SitepipeError::ConfigError(format!(
                    "config file {:?} does not exist",
                    path
                )));
            }
            let cfg = load_and_validate(&path)?;
            Ok((cfg, config_root_dir(&path)))
        }
        None => {
            let path = default_config_path();
            if path.is_file() {
                let cfg = load_and_validate(&path)?;
                Ok((cfg, config_root_dir(&path)))
            } else {
                debug!("no {} found; using built-in defaults", DEFAULT_CONFIG_FILE);
                Ok((ConfigFile::default(), config_root_dir(&path)))
            }
        }
    }
}

/// Helper to resolve the default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Figure out the project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "site/Sitepipe.toml"),
///   we use that directory.
/// - If it's just a bare filename (parent = ""), we fall back to the current
///   working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
