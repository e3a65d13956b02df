//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use quarry::{BackendKind, OutputFormat};
use std::path::PathBuf;

/// Quarry - natural-language analytics compiled to SQL
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(about = "Compile natural-language analytic requests to SQL and run them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Load configuration from this file instead of the layered defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend to run on (defaults to the configured one)
    #[arg(long, global = true)]
    pub engine: Option<EngineArg>,

    /// Skip the language model and use rule-based analysis only
    #[arg(long, global = true)]
    pub offline: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer one request
    Query {
        /// The request, in natural language
        text: String,

        /// Output format (defaults to the one named in the request, then config)
        #[arg(long)]
        format: Option<FormatArg>,

        /// Also write the result to this file (.csv for CSV, JSON otherwise)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Return only this 1-based page of rows
        #[arg(long)]
        page: Option<usize>,

        /// Rows per page
        #[arg(long, default_value = "100")]
        page_size: usize,
    },

    /// Run a small sample of the request
    Preview {
        /// The request, in natural language
        text: String,

        /// Rows to fetch
        #[arg(long, default_value = "10")]
        sample_size: u64,
    },

    /// Estimate run time and row count without running the request
    Estimate {
        /// The request, in natural language
        text: String,
    },

    /// Answer every request in a file, one per line
    Batch {
        /// File with one request per line; blank lines and `#` comments are skipped
        file: PathBuf,

        /// Output format for every result
        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// List the supported backends
    Engines,

    /// Show backend connection and health
    Status,
}

/// Result format options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    /// Columns, rows and a summary
    Json,
    /// Comma-separated text
    Csv,
    /// Aligned text table
    Table,
    /// Chart specification
    Chart,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Chart => OutputFormat::Chart,
        }
    }
}

/// Backend options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum EngineArg {
    /// Spark SQL through Livy
    Spark,
    /// Hive through WebHCat
    Hive,
    /// ClickHouse HTTP interface
    Clickhouse,
    /// Presto / Trino
    Presto,
}

impl From<EngineArg> for BackendKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Spark => BackendKind::Spark,
            EngineArg::Hive => BackendKind::Hive,
            EngineArg::Clickhouse => BackendKind::ClickHouse,
            EngineArg::Presto => BackendKind::Presto,
        }
    }
}
