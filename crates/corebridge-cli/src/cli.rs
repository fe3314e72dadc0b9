//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use corebridge_model::SystemType;

#[derive(Parser)]
#[command(
    name = "corebridge",
    version,
    about = "CoreBridge - schema mapping for enterprise system migrations",
    long_about = "Propose, rescore, and audit field mappings between a legacy \
                  enterprise system and its replacement.\n\n\
                  Schemas are matched with domain-aware similarity scoring, refined \
                  by platform heuristics, and checked against banking compliance rules."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Match two schemas and run the rescoring pipeline.
    Map(MapArgs),

    /// Infer a schema from an uploaded CSV or JSON file.
    Infer(InferArgs),

    /// Run the compliance rules over an existing mapping file.
    Scan(ScanArgs),
}

#[derive(Parser)]
pub struct MapArgs {
    /// Workspace JSON file describing the source and target schemas.
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,

    /// Output path for the mapping file (default: <WORKSPACE>.mappings.json).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Include the full step log in the output file.
    #[arg(long = "steps")]
    pub include_steps: bool,

    /// Disable the progress spinner.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Parser)]
pub struct InferArgs {
    /// Data file to infer a schema from (.csv, .tsv, .txt, or .json).
    #[arg(value_name = "DATA_FILE")]
    pub input: PathBuf,

    /// System the inferred entities belong to.
    #[arg(long = "system", value_enum, default_value = "custom")]
    pub system: SystemTypeArg,

    /// Output path for the schema file (default: <DATA_FILE>.schema.json).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ScanArgs {
    /// Mapping file produced by `corebridge map`.
    #[arg(value_name = "MAPPINGS")]
    pub mappings: PathBuf,

    /// Write the compliance report to this path as JSON.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// CLI system type choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum SystemTypeArg {
    Fis,
    Fiserv,
    JackHenry,
    Temenos,
    Salesforce,
    Dynamics,
    Sap,
    NetSuite,
    Custom,
}

impl From<SystemTypeArg> for SystemType {
    fn from(value: SystemTypeArg) -> Self {
        match value {
            SystemTypeArg::Fis => Self::Fis,
            SystemTypeArg::Fiserv => Self::Fiserv,
            SystemTypeArg::JackHenry => Self::JackHenry,
            SystemTypeArg::Temenos => Self::Temenos,
            SystemTypeArg::Salesforce => Self::Salesforce,
            SystemTypeArg::Dynamics => Self::Dynamics,
            SystemTypeArg::Sap => Self::Sap,
            SystemTypeArg::NetSuite => Self::NetSuite,
            SystemTypeArg::Custom => Self::Custom,
        }
    }
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
