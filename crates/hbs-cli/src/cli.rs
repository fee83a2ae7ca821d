//! CLI argument definitions for `hbs`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use hbs_clean::ClassificationRequest;
use hbs_config::YearSelection;

#[derive(Parser)]
#[command(
    name = "hbs",
    version,
    about = "Household budget survey cleaner - turn raw yearly extracts into typed tables",
    long_about = "Clean raw household budget survey extracts.\n\n\
                  Column names, types and category labels come from year-versioned\n\
                  YAML metadata; cleaned tables are written as Parquet."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding `metadata/` and `config/` (default: HBS_PACKAGE_DIR or the build tree).
    #[arg(long = "package-dir", value_name = "DIR", global = true)]
    pub package_dir: Option<PathBuf>,

    /// Root directory for local settings, metadata and data (default: current directory).
    #[arg(long = "root", value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

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
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean raw extracts into typed Parquet tables.
    Clean(CleanArgs),

    /// Show the merged settings.
    Settings,

    /// Inspect metadata documents.
    #[command(subcommand)]
    Metadata(MetadataCommand),

    /// List tables and the extract file each reads in a year.
    Tables(TablesArgs),

    /// Load one table across years and show or save it.
    Load(LoadArgs),

    /// Write editable local settings and metadata into the root directory.
    Init(InitArgs),
}

#[derive(Args)]
pub struct CleanArgs {
    /// Years to clean: all, last, 1390, 1390-1395 or a comma list.
    #[arg(long = "years", value_name = "YEARS", default_value = "last")]
    pub years: YearSelection,

    /// Tables to clean (default: every table in the metadata).
    #[arg(long = "tables", value_name = "TABLE", value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Write a JSON report of the batch to this path.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum MetadataCommand {
    /// List loaded documents with their sources and digests.
    Status,

    /// Show how each column of a table is cleaned in one year.
    Show {
        /// Table name.
        table: String,

        /// Survey year.
        #[arg(long = "year", value_name = "YEAR")]
        year: u32,
    },

    /// Label a code with a hierarchical classification.
    Label {
        /// Classification document (commodities, occupations).
        document: String,

        /// Classification name within the document.
        name: String,

        /// Code to label.
        code: u64,

        /// Survey year.
        #[arg(long = "year", value_name = "YEAR")]
        year: u32,
    },
}

#[derive(Args)]
pub struct TablesArgs {
    /// Survey year (default: the last configured year).
    #[arg(long = "year", value_name = "YEAR")]
    pub year: Option<u32>,
}

#[derive(Args)]
pub struct LoadArgs {
    /// Table name.
    pub table: String,

    /// Years to load: all, last, 1390, 1390-1395 or a comma list.
    #[arg(long = "years", value_name = "YEARS", default_value = "last")]
    pub years: YearSelection,

    /// Load the raw extracts or the cleaned tables.
    #[arg(long = "form", value_enum, default_value = "cleaned")]
    pub form: TableFormArg,

    /// Add classification labels: document.name:column:levels (repeatable).
    #[arg(long = "classify", value_name = "SPEC")]
    pub classify: Vec<ClassificationRequest>,

    /// Rows to print (0 prints none).
    #[arg(long = "head", value_name = "ROWS", default_value_t = 10)]
    pub head: usize,

    /// Write the stacked table to this Parquet file.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite local files that already exist.
    #[arg(long = "replace")]
    pub replace: bool,
}

/// CLI table form choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum TableFormArg {
    Raw,
    Cleaned,
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
