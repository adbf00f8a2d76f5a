// src/config/mod.rs

//! Configuration loading, validation and environment resolution.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate basic invariants like task-graph correctness (`validate.rs`).
//! - Resolve build mode and concrete paths (`env.rs`).

pub mod env;
pub mod loader;
pub mod model;
pub mod validate;

pub use env::{BuildContext, PathConfig};
pub use loader::{load_and_validate, load_from_path, resolve_config};
pub use model::{
    ConfigFile, ImagesSection, PathsSection, RawConfigFile, ScriptsSection, ServerSection,
    StylesSection, TasksSection, WatchSection,
};
