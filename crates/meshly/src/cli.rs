//! Clap derive structures for the `meshly` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// meshly -- telemetry collector and reporter for CloudMesh wifi meshes
#[derive(Debug, Parser)]
#[command(
    name = "meshly",
    version,
    about = "Collect and report wifi mesh telemetry from a CloudMesh dashboard",
    long_about = "Collects wifi mesh telemetry (networks, nodes, clients) from a\n\
        CloudMesh-style controller -- the signed REST API, or the legacy HTML\n\
        dashboard -- aggregates per-entity usage and uptime, and renders\n\
        operator reports.",
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
    /// Config file path (defaults to the XDG location)
    #[arg(long, env = "MESHLY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Restrict collection to one network by name
    #[arg(long, short = 'n', env = "MESHLY_NETWORK", global = true)]
    pub network: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// History period for the signed API
    #[arg(long, default_value = "day", global = true)]
    pub period: Period,

    /// Treat pixel-derived offline time as the alert trigger
    /// (instead of the reported down flag)
    #[arg(long, global = true)]
    pub alert_offline: bool,

    /// Let spare nodes alert too
    #[arg(long, global = true)]
    pub alert_spares: bool,

    /// Count a gateway's own client traffic into its gateway counters
    #[arg(long, global = true)]
    pub count_self_traffic: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "MESHLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "MESHLY_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Shared enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty tables (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Period {
    Day,
    Month,
    Year,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List collected networks
    #[command(alias = "net")]
    Networks,

    /// Node status report (gateway / relay / spare tables)
    Nodes,

    /// Client usage report
    #[command(alias = "users")]
    Clients,

    /// One-line roll-up: totals, client count, alerting nodes
    Summary,

    /// Full digest to the selected sinks
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Write the report to a file
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Render the HTML digest body instead of text tables
    /// (suitable for handing to a mailer)
    #[arg(long)]
    pub html: bool,

    /// Also print to stdout when writing a file
    #[arg(long, short = 's')]
    pub screen: bool,
}
