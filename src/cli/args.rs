//! Command-line argument definitions for sound-db
//!
//! Global flags select the raw data root, configuration file, verbosity and
//! output format; subcommands query the index and read data.

use crate::error::{Result, SoundDbError};
use crate::models::ParseOptions;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the sound-db query tool
///
/// Translates site identifiers such as DENAUPST2015 into data directory
/// paths and parsed tables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sound-db",
    version,
    about = "Query acoustic monitoring data by site identifier",
    long_about = "Reads acoustic monitoring data from a raw data root holding one directory per \
                  site-year (e.g. '2015 DENAUPST Upper Station'). Name a data type and a set of \
                  site identifiers; sound-db finds the files and prints or exports the parsed tables."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Raw data root holding one directory per site-year
    ///
    /// Overrides the config file and the SOUND_DB_ROOT environment variable.
    #[arg(
        short = 'r',
        long = "root",
        value_name = "PATH",
        global = true,
        help = "Raw data root directory"
    )]
    pub root: Option<PathBuf>,

    /// Path to configuration file (JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    ///
    /// Any -v also reports each skipped site during bulk reads.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for results
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        global = true,
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List indexed sites
    Sites(SitesArgs),
    /// List available data types
    Accessors,
    /// Decode a site identifier or data directory name
    Decode {
        /// Site ID (DENAUPST2015) or directory name (2015 DENAUPST Upper Station)
        value: String,
    },
    /// Show the files a data type resolves to for each site
    Paths(SelectionArgs),
    /// Read a data type for many sites and combine the results
    Read(ReadArgs),
    /// Read a data type for exactly one site, failing on any error
    Access(AccessArgs),
    /// Merge site metadata with derived data
    Metadata(MetadataArgs),
}

/// Filters for the sites command
#[derive(Debug, Clone, Parser)]
pub struct SitesArgs {
    /// Only sites in this unit (e.g. DENA)
    #[arg(long = "unit", value_name = "UNIT")]
    pub unit: Option<String>,

    /// Only sites recorded in this year
    #[arg(long = "year", value_name = "YEAR")]
    pub year: Option<String>,
}

/// Data type and sites shared by bulk commands
#[derive(Debug, Clone, Parser)]
pub struct SelectionArgs {
    /// Data type name (see `sound-db accessors`)
    #[arg(value_name = "ACCESSOR")]
    pub accessor: String,

    /// Site IDs; every indexed site when omitted
    #[arg(value_name = "SITE_ID")]
    pub sites: Vec<String>,

    /// Parser options as key=value pairs separated by ';'
    ///
    /// Recognized keys include n_rows, columns, separator, skip_rows,
    /// extension and analyst.
    #[arg(short = 'O', long = "options", value_name = "OPTIONS")]
    pub options: Option<ParseOptions>,
}

/// Arguments for the read command
#[derive(Debug, Clone, Parser)]
pub struct ReadArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Write the combined table to this CSV file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_file: Option<PathBuf>,
}

/// Arguments for the access command
#[derive(Debug, Clone, Parser)]
pub struct AccessArgs {
    /// Data type name (see `sound-db accessors`)
    #[arg(value_name = "ACCESSOR")]
    pub accessor: String,

    /// One site: SITE_ID, DIRECTORY, UNIT SITE YEAR or DIRECTORY UNIT SITE YEAR
    #[arg(value_name = "SITE", required = true, num_args = 1..=4)]
    pub specifier: Vec<String>,

    /// Parser options as key=value pairs separated by ';'
    #[arg(short = 'O', long = "options", value_name = "OPTIONS")]
    pub options: Option<ParseOptions>,

    /// Write the table to this CSV file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_file: Option<PathBuf>,
}

/// Arguments for the metadata command
#[derive(Debug, Clone, Parser)]
pub struct MetadataArgs {
    /// Site metadata table (CSV)
    #[arg(long = "metadata", value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Derived data table (CSV)
    #[arg(long = "derived", value_name = "FILE")]
    pub derived: Option<PathBuf>,

    /// Write the merged table to this CSV file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_file: Option<PathBuf>,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
    /// CSV format for data analysis
    Csv,
}

impl Args {
    /// Validate argument combinations not expressible in clap
    pub fn validate(&self) -> Result<()> {
        if let Some(root) = &self.root {
            if root.as_os_str().is_empty() {
                return Err(SoundDbError::configuration("--root must not be empty"));
            }
        }

        if let Some(Commands::Metadata(metadata)) = &self.command {
            if metadata.metadata.is_some() != metadata.derived.is_some() {
                return Err(SoundDbError::configuration(
                    "--metadata and --derived must be given together",
                ));
            }
        }

        Ok(())
    }

    /// Get log level based on verbosity
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}
