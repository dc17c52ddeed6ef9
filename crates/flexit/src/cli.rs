//! Clap derive structures for the `flexit` CLI.
//!
//! Defines the command tree, global flags, and shared types. Shared with
//! `build.rs` for man page generation, so only clap types may be used here.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// flexit -- control Flexit ventilation units from the command line
#[derive(Debug, Parser)]
#[command(
    name = "flexit",
    version,
    about = "Monitor and control Flexit ventilation units",
    long_about = "Reads sensor values and sets modes and temperature setpoints on a\n\
        Flexit ventilation unit through the Flexit GO cloud (Climatix IC).",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "FLEXIT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Flexit GO account e-mail (overrides profile)
    #[arg(long, short = 'u', env = "FLEXIT_USERNAME", global = true)]
    pub username: Option<String>,

    /// Flexit GO account password
    #[arg(long, env = "FLEXIT_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Subscription key override
    #[arg(long, env = "FLEXIT_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, env = "FLEXIT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLEXIT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates (debugging proxies)
    #[arg(long, short = 'k', env = "FLEXIT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FLEXIT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current sensor readings, setpoints and mode
    #[command(alias = "st")]
    Status,

    /// Show device model, firmware and serial information
    Info,

    /// Set the ventilation mode (Home, Away, High, "Cooker hood")
    Mode {
        /// Mode name
        name: String,
    },

    /// Set a temperature setpoint
    #[command(alias = "temperature")]
    Temp {
        /// Which setpoint to change
        target: SetpointTarget,

        /// Temperature in °C
        celsius: f64,
    },

    /// Poll the unit and print every new reading
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SetpointTarget {
    /// Setpoint used in Home mode
    Home,
    /// Setpoint used in Away mode
    Away,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (default: profile's update interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets redacted)
    Show,

    /// Set a profile value
    Set {
        /// Profile key (e.g., "username", "timeout", "update_interval_minutes")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the account password in the system keyring
    SetPassword {
        /// Profile name (defaults to active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
