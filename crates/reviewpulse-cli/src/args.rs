//! Command-line and environment configuration layer.

use std::path::PathBuf;

use clap::Parser;
use reviewpulse_core::{ConfigLayer, ReportFormat};

/// Fetch Google Places reviews for a list of branches, classify them with
/// Gemini, and write a per-review report.
#[derive(Debug, Parser)]
#[command(name = "reviewpulse", version, about)]
pub struct Args {
    /// TOML config file; command-line and environment values take precedence.
    #[arg(short, long, env = "REVIEWPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Place list CSV with place_id, city, office_name columns.
    #[arg(short, long, env = "REVIEWPULSE_INPUT")]
    pub input: Option<PathBuf>,

    /// Report path.
    #[arg(short, long, env = "REVIEWPULSE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Report format: csv or parquet.
    #[arg(long, env = "REVIEWPULSE_FORMAT")]
    pub format: Option<ReportFormat>,

    /// Comma-separated cities to process (case-insensitive). Empty means all.
    #[arg(long, env = "REVIEWPULSE_CITIES", value_delimiter = ',')]
    pub cities: Option<Vec<String>>,

    /// Choose cities from a menu when none are configured.
    #[arg(long)]
    pub interactive: bool,

    #[arg(long, env = "REVIEWPULSE_MODEL")]
    pub model: Option<String>,

    /// Reviews per model call.
    #[arg(long, env = "REVIEWPULSE_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Minimum milliseconds between model calls.
    #[arg(long, env = "REVIEWPULSE_BATCH_DELAY_MS")]
    pub batch_delay_ms: Option<u64>,

    /// Timeout for each Places or model request.
    #[arg(long, env = "REVIEWPULSE_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Batches of one place analysed at the same time.
    #[arg(long, env = "REVIEWPULSE_CONCURRENCY")]
    pub concurrency: Option<usize>,

    #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    pub places_api_key: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Rows of the report to print when done.
    #[arg(long, default_value_t = 5)]
    pub preview: usize,
}

impl Args {
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            places_api_key: self.places_api_key.clone(),
            gemini_api_key: self.gemini_api_key.clone(),
            model: self.model.clone(),
            cities: self.cities.clone(),
            batch_size: self.batch_size,
            batch_delay_ms: self.batch_delay_ms,
            request_timeout_secs: self.request_timeout_secs,
            concurrency: self.concurrency,
            input: self.input.clone(),
            output: self.output.clone(),
            format: self.format,
        }
    }
}
