//! CLI argument definitions for `recon`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use recon_cli::args::Assignment;

#[derive(Parser)]
#[command(
    name = "recon",
    version,
    about = "Reconcile two business documents through the reconciliation service",
    long_about = "Reconcile a source document against a target document.\n\n\
                  Columns are discovered by the remote service, mapped pairwise,\n\
                  and the service classifies every record as matching, missing\n\
                  from either side, or unknown."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Settings file (default: the per-user config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Override the service base URL from the settings file.
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Discover and print the columns of one document.
    Columns(ColumnsArgs),

    /// Compare a source document against a target document.
    Compare(CompareArgs),

    /// Delete a saved comparison.
    Delete(DeleteArgs),
}

#[derive(Parser)]
pub struct ColumnsArgs {
    /// Document to analyze.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Parser)]
pub struct CompareArgs {
    /// Base document.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Document audited against the base.
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Map a source column to a target column (repeatable).
    ///
    /// Without any --map the automatically seeded rows are used.
    #[arg(long = "map", value_name = "SRC=TGT", value_parser = Assignment::parse)]
    pub map: Vec<Assignment>,

    /// Guidance for the service about one mapped source column (repeatable).
    #[arg(long = "instruction", value_name = "SRC=TEXT", value_parser = Assignment::parse)]
    pub instruction: Vec<Assignment>,

    /// Save the result under this name and print its id.
    #[arg(long = "save", value_name = "NAME")]
    pub save: Option<String>,

    /// Write the exported report to this file or directory.
    #[arg(long = "export", value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Print the result as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct DeleteArgs {
    /// Id returned when the comparison was saved.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Confirm the deletion.
    #[arg(long = "yes")]
    pub yes: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
