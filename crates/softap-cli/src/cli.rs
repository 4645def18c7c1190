//! Clap derive structures for the `softap` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// softap -- drive a Soft Access Point lifecycle from the command line
#[derive(Debug, Parser)]
#[command(
    name = "softap",
    version,
    about = "Run and inspect a Soft Access Point lifecycle",
    long_about = "A CLI front end for the SoftAP lifecycle manager.\n\n\
        Wires a simulated driver/capability/channel-planner stack to the\n\
        real lifecycle state machine so the hierarchical Idle/Running\n\
        behavior can be exercised without real radio hardware.",
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
    /// Path to the persisted configuration file
    #[arg(long, env = "SOFTAP_CONFIG_PATH", global = true)]
    pub config_path: Option<std::path::PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "plain", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable one-line summaries
    Plain,
    /// Pretty-printed JSON
    Json,
}

// ── Subcommands ───────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a simulated SoftAP lifecycle for a fixed duration
    Run(RunArgs),
    /// Inspect or edit the persisted default configuration
    Config(ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

/// A single band selection for `--band`; repeat the flag for bridged mode.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BandArg {
    #[value(name = "2.4ghz")]
    Ghz2_4,
    #[value(name = "5ghz")]
    Ghz5,
    #[value(name = "6ghz")]
    Ghz6,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecurityArg {
    Open,
    WpaPersonal,
    WpaEnterprise,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Network name. Overrides the persisted configuration when set.
    #[arg(long)]
    pub ssid: Option<String>,

    /// Bands to bring up; repeat for bridged mode (e.g. --band 2.4ghz --band 5ghz)
    #[arg(long = "band", value_enum)]
    pub bands: Vec<BandArg>,

    /// Security mode
    #[arg(long, value_enum)]
    pub security: Option<SecurityArg>,

    /// Hide the SSID from scan results
    #[arg(long)]
    pub hidden: bool,

    /// Maximum connected clients (0 = hardware default)
    #[arg(long)]
    pub max_clients: Option<u32>,

    /// Explicit shutdown timeout once idle
    #[arg(long, value_parser = humantime::parse_duration)]
    pub shutdown_timeout: Option<std::time::Duration>,

    /// Disable the no-clients auto-shutdown timer entirely
    #[arg(long)]
    pub no_auto_shutdown: bool,

    /// Simulated hardware client cap
    #[arg(long, default_value_t = 8)]
    pub capability_max_clients: u32,

    /// How long to let the simulated lifecycle run before stopping it
    #[arg(long, value_parser = humantime::parse_duration, default_value = "5s")]
    pub duration: std::time::Duration,

    /// Identifier used as the requestor string (matches the orchestrator's caller identity)
    #[arg(long, default_value = "cli")]
    pub requestor: String,

    /// Run as a tethered AP (IP plane attached to the device's upstream connection)
    #[arg(long)]
    pub tethered: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration
    Show,
    /// Write the built-in default configuration to the config file
    Init,
    /// Set a single field on the persisted configuration
    Set { key: String, value: String },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
