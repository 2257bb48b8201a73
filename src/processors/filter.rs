use crate::models::{AirQualityRecord, Dataset, FilterCriteria, WeatherCodes};
use tracing::{debug, warn};

/// Applies [`FilterCriteria`] to a dataset: date range, then season, then
/// weather. All three steps are conjunctive and order-preserving.
#[derive(Debug, Clone, Default)]
pub struct DatasetFilter {
    weather_codes: WeatherCodes,
}

impl DatasetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weather_codes(weather_codes: WeatherCodes) -> Self {
        Self { weather_codes }
    }

    pub fn weather_codes(&self) -> &WeatherCodes {
        &self.weather_codes
    }

    /// Filter `dataset` into a new dataset. An inverted date range yields an
    /// empty result rather than an error.
    pub fn apply(&self, dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
        if criteria.date_range.is_inverted() {
            debug!(range = %criteria.date_range, "inverted date range");
        }

        let weather_code = if dataset.has_weather_column() {
            criteria.weather.code(&self.weather_codes)
        } else {
            if criteria.weather.code(&self.weather_codes).is_some() {
                warn!(
                    weather = %criteria.weather,
                    "dataset has no weathersit column, weather filter skipped"
                );
            }
            None
        };

        let records: Vec<AirQualityRecord> = dataset
            .records()
            .iter()
            .filter(|r| criteria.date_range.contains(&r.date_time))
            .filter(|r| criteria.season.contains_month(r.month()))
            .filter(|r| weather_code.map_or(true, |code| r.weathersit == Some(code)))
            .cloned()
            .collect();

        debug!(
            input = dataset.len(),
            output = records.len(),
            criteria = %criteria.describe(),
            "applied filter"
        );

        dataset.derive(records)
    }

    /// Whether the weather selector should be offered for `dataset`.
    pub fn weather_filter_available(&self, dataset: &Dataset) -> bool {
        dataset.has_weather_column()
    }
}
