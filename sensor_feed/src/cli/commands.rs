use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(author, version, about = "Fetch and normalize sensor time series")]
pub struct Cli {
    /// Path to the config file (sensor_feed.toml); built-in defaults when omitted
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one acquisition cycle and report the outcome
    Fetch(FetchArgs),

    /// Print the resolved configuration as TOML
    Config,
}

#[derive(Args, Debug, Default)]
pub struct FetchArgs {
    /// Endpoint returning the JSON record array
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Comma-separated metric names (e.g. "temperature,humidity")
    #[arg(long)]
    pub metrics: Option<String>,

    /// Total attempts, including the first one
    #[arg(long)]
    pub max_attempts: Option<u32>,

    #[arg(long)]
    pub base_delay_ms: Option<u64>,

    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Date for bare HH:MM timestamps (YYYY-MM-DD); today (UTC) when omitted
    #[arg(long)]
    pub reference_date: Option<NaiveDate>,

    /// Also write the chart datasets as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per series: points and time range
    #[default]
    Summary,
    /// Chart datasets as pretty JSON
    Json,
}
