//! Clap derive structures for the `streamtopo` CLI.
//!
//! Kept free of workspace crates so `build.rs` can include it for man
//! page generation.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// streamtopo -- inspect and steer media streams on an SDN controller
#[derive(Debug, Parser)]
#[command(
    name = "streamtopo",
    version,
    about = "Inspect an SDN topology and steer media streams across it",
    long_about = "Client for an OpenFlow topology controller.\n\n\
        Loads switches, links and hosts over REST, follows topology\n\
        notifications over a JSON-RPC WebSocket, and issues streaming\n\
        actions (source, receive, priority).",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "STREAMTOPO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "STREAMTOPO_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STREAMTOPO_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "STREAMTOPO_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "STREAMTOPO_TIMEOUT", global = true)]
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
    /// Plain text, one identifier per line (scripting)
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the topology once and print it
    #[command(alias = "snap", alias = "s")]
    Snapshot(SnapshotArgs),

    /// Follow topology notifications and print each change
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Make a host the source of a stream
    SourceFor(BindingArgs),

    /// Subscribe a host to a stream
    ReceiveFrom(BindingArgs),

    /// Set a switch's priority for a stream
    #[command(alias = "prio")]
    Priority(PriorityArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Snapshot / Watch ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TopologyView {
    /// Counts and stream list
    Summary,
    /// Switches with per-stream priorities
    Switches,
    /// Hosts with attachment point and bindings
    Hosts,
    /// Links with their style under the selection
    Links,
    /// Occupied switch ports
    Ports,
    /// Stream ids and their sources
    Streams,
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// What to print
    #[arg(long, value_enum, default_value = "summary")]
    pub view: TopologyView,

    /// Style links for this stream instead of the plain topology
    #[arg(long, short = 's')]
    pub stream: Option<u32>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Streaming actions ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BindingArgs {
    /// Host MAC address
    pub mac: String,

    /// Stream id
    pub stream_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Level {
    Low,
    Mid,
    High,
}

#[derive(Debug, Args)]
pub struct PriorityArgs {
    /// Switch datapath id
    pub dpid: String,

    /// Stream id
    pub stream_id: u32,

    /// Priority level (low = 1, mid = 5, high = 9)
    #[arg(value_enum)]
    pub level: Level,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Add or replace a profile
    Add {
        /// Profile name
        name: String,

        /// Controller base URL
        controller: String,

        /// Notification socket path
        #[arg(long)]
        ws_path: Option<String>,

        /// Accept self-signed TLS certificates for this profile
        #[arg(long)]
        insecure_tls: bool,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a profile
    Remove {
        /// Profile name
        name: String,
    },

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
