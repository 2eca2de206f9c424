//! Clap derive structures for the `vandash` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. This
//! file is also compiled by `build.rs` for man pages, so it may only
//! depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vandash -- control and monitor a camper van from the command line
#[derive(Debug, Parser)]
#[command(
    name = "vandash",
    version,
    about = "Control the van's inverter, LEDs and files, and read its sensors",
    long_about = "Talks to the van dashboard backend over HTTP.\n\n\
        Reads the inverter, LED strip, level sensor and battery shunt,\n\
        toggles and configures devices, and manages the file share.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "VANDASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'u', env = "VANDASH_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VANDASH_OUTPUT",
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

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VANDASH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "VANDASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One-shot overview of every device
    #[command(alias = "st")]
    Status,

    /// Follow the level sensor and battery readings
    Watch(WatchArgs),

    /// Read or toggle the inverter
    #[command(alias = "inv")]
    Inverter(InverterArgs),

    /// Read or configure the LED strip
    #[command(alias = "led")]
    Leds(LedsArgs),

    /// Read the level sensor
    Level,

    /// Read the battery shunt
    #[command(alias = "bat")]
    Battery,

    /// Browse and manage the file share
    #[command(alias = "f")]
    Files(FilesArgs),

    /// Backend process control
    App(AppArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Polling period, e.g. "15s" or "1m" (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<String>,

    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
}

// ── Inverter ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InverterArgs {
    #[command(subcommand)]
    pub command: InverterCommand,
}

#[derive(Debug, Subcommand)]
pub enum InverterCommand {
    /// Show whether the inverter is on
    Status,

    /// Flip the inverter on or off
    Toggle,
}

// ── LEDs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LedsArgs {
    #[command(subcommand)]
    pub command: LedsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LedsCommand {
    /// Show the LED strip state
    Status,

    /// Change LED settings; unspecified settings keep their current value
    Set(LedSetArgs),
}

#[derive(Debug, Args)]
pub struct LedSetArgs {
    /// Turn the strip on
    #[arg(long, conflicts_with = "off")]
    pub on: bool,

    /// Turn the strip off
    #[arg(long)]
    pub off: bool,

    /// Brightness, 0-100
    #[arg(long, short = 'b', value_parser = clap::value_parser!(u8).range(0..=100))]
    pub brightness: Option<u8>,

    /// Color as "r,g,b" or "#rrggbb"
    #[arg(long, short = 'c')]
    pub color: Option<String>,

    /// Animation preset: rainbow, chase, pulse, or none
    #[arg(long)]
    pub preset: Option<String>,

    /// Sleep timer: off, 5m, 30m, 1h, 2h
    #[arg(long)]
    pub sleep: Option<String>,
}

// ── Files ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FilesArgs {
    #[command(subcommand)]
    pub command: FilesCommand,
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List a folder
    #[command(alias = "list")]
    Ls {
        /// Folder path; the root when omitted
        #[arg(default_value = "")]
        path: String,
    },

    /// Upload files into a folder
    Upload {
        /// Local files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination folder; the root when omitted
        #[arg(long, short = 't', default_value = "")]
        to: String,
    },

    /// Create a folder
    Mkdir {
        /// New folder name
        name: String,

        /// Parent folder; the root when omitted
        #[arg(long = "in", default_value = "")]
        parent: String,
    },

    /// Delete a file or folder
    Rm {
        /// Path of the file or folder
        path: String,
    },

    /// Lock a folder with its password
    Lock {
        /// Folder path
        path: String,
    },

    /// Unlock a folder
    Unlock {
        /// Folder path
        path: String,
    },

    /// Send a locked folder's password, then list it
    Auth {
        /// Folder path
        path: String,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Print the view URL of a file
    Url {
        /// File path
        path: String,
    },
}

// ── App ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: AppCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppCommand {
    /// Stop the backend process so its supervisor restarts it
    Kill,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive wizard that writes a profile
    Init,

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
