//! Clap derive structures for the `hcsync` CLI.
//!
//! Also compiled by `build.rs` for man pages, so this file may only
//! depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hcsync -- forward Home Center telemetry to InfluxDB
#[derive(Debug, Parser)]
#[command(
    name = "hcsync",
    version,
    about = "Forward Home Center telemetry to InfluxDB",
    long_about = "Pulls panel events, energy consumption and device state changes from a\n\
        Home Center controller and writes them to an InfluxDB 1.x database.\n\n\
        Every stream remembers how far it got, so each run picks up where the\n\
        previous one stopped. Run it from cron.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (default: $HCSYNC_CONFIG, then the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress and summary output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "HCSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Home Center request timeout in seconds (0 disables)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log points instead of writing them; cursors are not persisted
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forward new entries of the panel event log
    Events(EventsArgs),

    /// Forward per-device energy consumption windows
    #[command(alias = "energy")]
    Consumption(ConsumptionArgs),

    /// Forward device state changes from one refreshStates poll
    RefreshStates,

    /// Write a weather reading
    Weather,

    /// Write memory, storage and CPU usage of the controller
    #[command(alias = "diag")]
    Diagnostics,

    /// Inspect configuration and store passwords
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Events per request
    #[arg(long, short = 'l', default_value_t = 25, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,

    /// Requests allowed in this run
    #[arg(long, default_value_t = 1)]
    pub max_calls: u32,
}

#[derive(Debug, Args)]
pub struct ConsumptionArgs {
    /// Device to poll (repeatable; default: [consumption].devices)
    #[arg(long = "device", short = 'd', value_name = "ID")]
    pub devices: Vec<u64>,

    /// Window length in seconds
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(i64).range(1..))]
    pub span: i64,

    /// Requests allowed per device in this run
    #[arg(long, default_value_t = 3)]
    pub max_calls: u32,

    /// Where devices without a stored cursor start (Unix seconds)
    #[arg(long, default_value_t = 1_577_836_800)]
    pub start_timestamp: i64,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration with passwords masked
    Show,

    /// Print the config file location
    Path,

    /// Prompt for a password and store it in the system keyring
    SetPassword {
        /// Which connection the password belongs to
        target: PasswordTarget,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PasswordTarget {
    /// Home Center
    Hc,
    /// InfluxDB
    Influx,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
