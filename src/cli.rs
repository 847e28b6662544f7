use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::{Args, Parser, Subcommand};

use crate::classify::{DEFAULT_MAX_OPTIONS, DEFAULT_MIN_OPTIONS, InferenceOptions};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer typed schemas from JSON records and filter them by typed conditions",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer the schema of a JSON array of records
    Describe(DescribeArgs),
    /// Filter the typed records of a JSON array by field conditions
    Query(QueryArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InferenceArgs {
    /// Fewest distinct values a categorical field needs to become OPTION
    #[arg(long = "min-options", default_value_t = DEFAULT_MIN_OPTIONS)]
    pub min_options: usize,
    /// Most distinct values a categorical field may have to become OPTION
    #[arg(long = "max-options", default_value_t = DEFAULT_MAX_OPTIONS)]
    pub max_options: usize,
}

impl InferenceArgs {
    pub fn options(&self) -> Result<InferenceOptions> {
        ensure!(
            self.min_options <= self.max_options,
            "--min-options ({}) cannot exceed --max-options ({})",
            self.min_options,
            self.max_options
        );
        Ok(InferenceOptions {
            min_options: self.min_options,
            max_options: self.max_options,
        })
    }
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Input JSON file holding an array of records ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Write the schema here (.json, or .yml/.yaml) instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub inference: InferenceArgs,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Input JSON file holding an array of records ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Where clause as JSON, e.g. '{"age": {"gt": 18}}'
    #[arg(long = "where", conflicts_with = "where_file")]
    pub where_json: Option<String>,
    /// File containing the where clause as JSON
    #[arg(long = "where-file")]
    pub where_file: Option<PathBuf>,
    /// Shorthand conditions such as `age>18` or `status=shipped`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Use a saved schema instead of inferring one from the input
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// Limit number of records emitted
    #[arg(long)]
    pub limit: Option<usize>,
    /// Emit compact single-line JSON
    #[arg(long)]
    pub compact: bool,
    #[command(flatten)]
    pub inference: InferenceArgs,
}
