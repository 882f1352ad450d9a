use std::path::PathBuf;

use clap::Parser;

use crate::output::OutputFormat;
use crate::runner::StatScope;

#[derive(Parser, Debug, Default)]
#[command(name = "octofhir-sample-client")]
#[command(about = "Search Patient resources by last name and measure FHIR server response times")]
#[command(version)]
pub struct Cli {
    /// Server base URL (overrides config file)
    #[arg(short, long, env = "OCTOFHIR_URL")]
    pub server: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the names file
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Names file, one last name per line
    #[arg(long)]
    pub names_file: Option<String>,

    /// Number of passes over all names; the last one runs without caching
    #[arg(long)]
    pub passes: Option<usize>,

    /// Print first name, last name and birth date of every match
    #[arg(long)]
    pub print_patients: bool,

    /// Output format for printed patients
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Whether reported averages cover each pass or everything so far
    #[arg(long)]
    pub stat_scope: Option<StatScope>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    pub log_level: Option<String>,

    /// Per-request timeout in seconds (none by default)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}
