// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build static-site assets; watch and serve them during development.",
    long_about = None
)]
pub struct CliArgs {
    /// Entry point to run. Defaults to `build`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the config file (TOML).
    ///
    /// When omitted, `Sitepipe.toml` in the current directory is used if it
    /// exists, otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Resolve mode, paths and the task graph, print them, and exit.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl CliArgs {
    /// The selected entry point, `build` when no subcommand was given.
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Build)
    }
}

/// The two named entry points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Clean, run every transform task once, and exit.
    Build,
    /// Build, then serve the output and rebuild on source changes.
    Dev,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_build() {
        let args = CliArgs::parse_from(["sitepipe"]);
        assert_eq!(args.command(), Command::Build);
        assert!(args.config.is_none());
    }

    #[test]
    fn dev_accepts_global_flags() {
        let args = CliArgs::parse_from(["sitepipe", "dev", "--config", "site.toml", "--dry-run"]);
        assert_eq!(args.command(), Command::Dev);
        assert_eq!(args.config.as_deref(), Some("site.toml"));
        assert!(args.dry_run);
    }
}
