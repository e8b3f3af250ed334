//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "shade", version, about = "Shade position controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/shade_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Move the shade to a percentage of its travel (0 = closed, 100 = open)
    MovePercent {
        #[arg(long)]
        percent: i32,
    },
    /// Move to an absolute motor position in microsteps
    MoveTo {
        #[arg(long)]
        position: i32,
    },
    /// Calibrate the fully-closed end of travel (the new zero)
    SetMin,
    /// Calibrate the fully-open end of travel (the new maximum)
    SetMax,
    /// Print the persisted position without moving
    Status,
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
