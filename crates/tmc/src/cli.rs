//! Clap derive structures for the `tmc` harness.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tmc_core::ResourceKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tmc -- drive the provider core from the command line
#[derive(Debug, Parser)]
#[command(
    name = "tmc",
    version,
    about = "Expand, flatten, and manage TMC resources described as configuration trees",
    long_about = "Reads a resource's configuration tree from a JSON or YAML file and\n\
        either converts it to the control plane object (expand), converts an\n\
        object back into a tree (flatten), or runs a lifecycle operation\n\
        against the control plane.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "TMC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "TMC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TMC_OUTPUT",
        default_value = "json",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Seconds between convergence probes (overrides profile)
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    /// Seconds to wait for convergence; 0 probes once (overrides profile)
    #[arg(long, global = true)]
    pub poll_timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a configuration tree into the control plane object
    Expand(ResourceArgs),

    /// Convert a control plane object into a configuration tree
    Flatten(ResourceArgs),

    /// Create the resource and print the resulting tree
    Create(ResourceArgs),

    /// Read the resource and print its current tree
    Read(ResourceArgs),

    /// Update the resource and print the resulting tree
    Update(ResourceArgs),

    /// Delete the resource, waiting until it is gone
    Delete(ResourceArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ResourceArgs {
    /// Resource kind
    #[arg(value_enum)]
    pub kind: Kind,

    /// JSON or YAML input file, or "-" for stdin
    pub file: PathBuf,
}

/// Resource kinds accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Kind {
    ClusterGroup,
    DataProtection,
}

impl From<Kind> for ResourceKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::ClusterGroup => Self::ClusterGroup,
            Kind::DataProtection => Self::DataProtection,
        }
    }
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
