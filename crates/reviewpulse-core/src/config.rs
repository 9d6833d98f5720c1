//! Run configuration, resolved once at startup.
//!
//! Each source (command line, environment, TOML file, interactive prompt)
//! produces a [`ConfigLayer`]. Layers are merged with [`ConfigLayer::or`]
//! and then [`resolve`](ConfigLayer::resolve)d into an immutable
//! [`RunConfig`]. Nothing changes after resolution.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::DEFAULT_BATCH_SIZE;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1200;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_INPUT: &str = "place_ids.csv";
pub const DEFAULT_OUTPUT: &str = "reviews_report.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential {0}: set it on the command line, in the environment, or in the config file")]
    MissingCredential(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("reading config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown report format {0:?} (expected `csv` or `parquet`)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Parquet,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

/// Which cities of the input place list to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CityFilter {
    #[default]
    All,
    /// Lower-cased, trimmed city names.
    Only(Vec<String>),
}

impl CityFilter {
    /// Build from user-supplied names. Blank entries are ignored; no
    /// remaining names means all cities.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cities: Vec<String> = names
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if cities.is_empty() {
            Self::All
        } else {
            Self::Only(cities)
        }
    }

    /// Case-insensitive match. A place with no city only passes [`CityFilter::All`].
    pub fn matches(&self, city: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(cities) => city.is_some_and(|c| {
                let c = c.trim().to_lowercase();
                cities.iter().any(|wanted| *wanted == c)
            }),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for CityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all cities"),
            Self::Only(cities) => f.write_str(&cities.join(", ")),
        }
    }
}

/// One configuration source. Unset fields defer to lower-precedence layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub places_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub model: Option<String>,
    pub cities: Option<Vec<String>>,
    pub batch_size: Option<usize>,
    pub batch_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<ReportFormat>,
}

impl ConfigLayer {
    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Merge: fields set in `self` win over `fallback`.
    pub fn or(self, fallback: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            places_api_key: self.places_api_key.or(fallback.places_api_key),
            gemini_api_key: self.gemini_api_key.or(fallback.gemini_api_key),
            model: self.model.or(fallback.model),
            cities: self.cities.or(fallback.cities),
            batch_size: self.batch_size.or(fallback.batch_size),
            batch_delay_ms: self.batch_delay_ms.or(fallback.batch_delay_ms),
            request_timeout_secs: self.request_timeout_secs.or(fallback.request_timeout_secs),
            concurrency: self.concurrency.or(fallback.concurrency),
            input: self.input.or(fallback.input),
            output: self.output.or(fallback.output),
            format: self.format.or(fallback.format),
        }
    }

    /// Apply defaults and validate.
    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        let places_api_key = required(self.places_api_key, "GOOGLE_MAPS_API_KEY")?;
        let gemini_api_key = required(self.gemini_api_key, "GEMINI_API_KEY")?;

        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(ConfigError::Zero("batch size"));
        }
        let concurrency = self.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::Zero("concurrency"));
        }
        let request_timeout_secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(ConfigError::Zero("request timeout"));
        }

        Ok(RunConfig {
            places_api_key,
            gemini_api_key,
            model: self
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            batch_size,
            batch_delay: Duration::from_millis(
                self.batch_delay_ms.unwrap_or(DEFAULT_BATCH_DELAY_MS),
            ),
            request_timeout: Duration::from_secs(request_timeout_secs),
            concurrency,
            cities: CityFilter::from_names(self.cities.unwrap_or_default()),
            input: self.input.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT)),
            output: self.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            format: self.format.unwrap_or_default(),
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingCredential(name))
}

/// Immutable configuration for one run.
#[derive(Clone)]
pub struct RunConfig {
    pub places_api_key: String,
    pub gemini_api_key: String,
    pub model: String,
    pub batch_size: usize,
    /// Minimum spacing between model calls.
    pub batch_delay: Duration,
    pub request_timeout: Duration,
    /// Batches of one place analysed concurrently.
    pub concurrency: usize,
    pub cities: CityFilter,
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: ReportFormat,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("places_api_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .field("batch_delay", &self.batch_delay)
            .field("request_timeout", &self.request_timeout)
            .field("concurrency", &self.concurrency)
            .field("cities", &self.cities)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("format", &self.format)
            .finish()
    }
}
