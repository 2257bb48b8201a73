use crate::error::Result;
use crate::models::WeatherCodes;
use crate::processors::{Aggregator, DatasetFilter, RainBucket};
use crate::readers::DatasetReader;
use crate::utils::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_DATA_FILE, DEFAULT_HISTOGRAM_BINS, DEFAULT_PREVIEW_ROWS,
    ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

/// Runtime settings, layered: built-in defaults, then an optional TOML file,
/// then `AIRQ_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub data_path: PathBuf,

    #[validate(range(min = 1))]
    pub preview_rows: usize,

    #[validate(range(min = 1, max = 500))]
    pub histogram_bins: usize,

    /// Reject negative pollutant readings while loading.
    pub strict_validation: bool,

    /// Force memory-mapped (`true`) or buffered (`false`) reads.
    pub use_mmap: Option<bool>,

    #[validate(custom(function = "validate_rain_buckets"))]
    pub rain_buckets: Vec<RainBucket>,

    pub weather_codes: WeatherCodes,

    pub home: HomeSettings,
}

/// Text shown on the Home page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeSettings {
    pub title: String,
    pub subtitle: String,
    pub author: Option<String>,
    pub email: Option<String>,
}

impl Default for HomeSettings {
    fn default() -> Self {
        Self {
            title: "Air Quality Analysis Dashboard".to_string(),
            subtitle: "Exploratory analysis of hourly air-quality observations".to_string(),
            author: None,
            email: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            strict_validation: false,
            use_mmap: None,
            rain_buckets: RainBucket::defaults(),
            weather_codes: WeatherCodes::default(),
            home: HomeSettings::default(),
        }
    }
}

fn validate_rain_buckets(buckets: &[RainBucket]) -> std::result::Result<(), ValidationError> {
    if buckets.is_empty() {
        return Err(ValidationError::new("rain_buckets_empty"));
    }

    let mut lower = 0.0;
    for bucket in buckets {
        if bucket.upper <= lower {
            return Err(ValidationError::new("rain_buckets_not_increasing"));
        }
        lower = bucket.upper;
    }

    Ok(())
}

impl Settings {
    /// Load settings. An explicit `config_file` must exist; otherwise
    /// `air-quality.toml` in the working directory is used when present.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let file_source = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(?settings, "settings loaded");
        Ok(settings)
    }

    pub fn reader(&self) -> DatasetReader {
        let reader = DatasetReader::new().with_strict_validation(self.strict_validation);
        match self.use_mmap {
            Some(use_mmap) => reader.with_mmap(use_mmap),
            None => reader,
        }
    }

    pub fn filter(&self) -> DatasetFilter {
        DatasetFilter::with_weather_codes(self.weather_codes)
    }

    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new()
            .with_rain_buckets(self.rain_buckets.clone())
            .with_histogram_bins(self.histogram_bins)
    }
}
