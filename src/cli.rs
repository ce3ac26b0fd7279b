// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `eventmgr`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "eventmgr",
    version,
    about = "Run the priority event/handler scheduler over a simulated vehicle mission.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Eventmgr.toml` in the current working directory. A missing
    /// default file means built-in defaults; a missing explicit file is an
    /// error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Stop after this many ticks (overrides `[loop].max_ticks`).
    #[arg(long, value_name = "N")]
    pub ticks: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EVENTMGR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the event table, but don't run the loop.
    #[arg(long)]
    pub dry_run: bool,
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
