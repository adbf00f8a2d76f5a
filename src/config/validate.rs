// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SitepipeError};
use crate::pipeline::catalog::{known_task_names, CLEAN_TASK};
use crate::pipeline::source::normalize;
use crate::pipeline::styles::browser_targets;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_server(cfg)?;
    validate_watch(cfg)?;
    validate_assets(cfg)?;
    validate_disabled_tasks(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;

    for (key, value) in [
        ("source", &paths.source),
        ("development", &paths.development),
        ("production", &paths.production),
    ] {
        if value.trim().is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "[paths].{key} must not be empty"
            )));
        }
    }

    let source = normalize(Path::new(paths.source.trim()));
    let development = normalize(Path::new(paths.development.trim()));
    let production = normalize(Path::new(paths.production.trim()));

    if development == production {
        return Err(SitepipeError::ConfigError(format!(
            "[paths].development and [paths].production must differ (both are '{}')",
            paths.development
        )));
    }

    for (key, raw, output) in [
        ("development", &paths.development, &development),
        ("production", &paths.production, &production),
    ] {
        let reject = |why: &str| {
            Err(SitepipeError::ConfigError(format!(
                "[paths].{key} = '{raw}' {why}; cleaning it would delete files outside the build output"
            )))
        };

        if output.as_os_str().is_empty() {
            return reject("is the project root");
        }
        if output.starts_with("..") {
            return reject("leaves the project root");
        }
        if output.parent().is_none() {
            return reject("is a filesystem root");
        }
        if output.is_absolute() != source.is_absolute() {
            continue;
        }
        if source.starts_with(output) {
            return reject(&format!("contains the source directory '{}'", paths.source));
        }
        if output.starts_with(&source) {
            return reject(&format!("is inside the source directory '{}'", paths.source));
        }
    }

    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(SitepipeError::ConfigError(
            "[server].host must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    // triggered_while_running_behaviour is strongly typed and validated
    // during deserialization.
    if cfg.watch.queue_length == 0 {
        return Err(SitepipeError::ConfigError(
            "[watch].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_assets(cfg: &RawConfigFile) -> Result<()> {
    let quality = cfg.images.jpeg_quality;
    if !(1..=100).contains(&quality) {
        return Err(SitepipeError::ConfigError(format!(
            "[images].jpeg_quality must be within 1..=100 (got {quality})"
        )));
    }

    browser_targets(&cfg.styles.targets)
        .map_err(|e| SitepipeError::ConfigError(format!("[styles].targets: {e}")))?;

    if !is_js_identifier(&cfg.scripts.global_name) {
        return Err(SitepipeError::ConfigError(format!(
            "[scripts].global_name '{}' is not a valid JavaScript identifier",
            cfg.scripts.global_name
        )));
    }

    for (key, value) in [
        ("entry", &cfg.scripts.entry),
        ("bundle", &cfg.scripts.bundle),
    ] {
        if value.trim().is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "[scripts].{key} must not be empty"
            )));
        }
    }

    Ok(())
}

fn validate_disabled_tasks(cfg: &RawConfigFile) -> Result<()> {
    let known = known_task_names();

    for name in cfg.tasks.disabled.iter() {
        if name == CLEAN_TASK {
            return Err(SitepipeError::ConfigError(
                "[tasks].disabled cannot contain 'clean'; every build starts from a clean output directory".to_string(),
            ));
        }
        if !known.contains(&name.as_str()) {
            return Err(SitepipeError::TaskNotFound(format!(
                "'{}' in [tasks].disabled (known tasks: {})",
                name,
                known.join(", ")
            )));
        }
    }

    Ok(())
}

fn is_js_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
