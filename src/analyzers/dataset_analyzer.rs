use crate::models::{Column, Dataset};
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub total_records: usize,
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,
    pub has_weather_column: bool,
    pub weather_coded_records: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Serialize)]
pub struct ColumnSummary {
    pub column: Column,
    pub present: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl ColumnSummary {
    pub fn missing_percentage(&self) -> f64 {
        let total = self.present + self.missing;
        if total == 0 {
            0.0
        } else {
            (self.missing as f64 / total as f64) * 100.0
        }
    }
}

/// Descriptive statistics for the dataset preview page.
pub struct DatasetAnalyzer;

impl DatasetAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, dataset: &Dataset) -> DatasetSummary {
        let columns = Column::ALL
            .into_iter()
            .filter(|c| dataset.has_column(*c))
            .map(|c| self.summarize_column(dataset, c))
            .collect();

        DatasetSummary {
            total_records: dataset.len(),
            date_range: dataset.time_bounds(),
            has_weather_column: dataset.has_weather_column(),
            weather_coded_records: dataset
                .records()
                .iter()
                .filter(|r| r.weathersit.is_some())
                .count(),
            columns,
        }
    }

    fn summarize_column(&self, dataset: &Dataset, column: Column) -> ColumnSummary {
        let mut present = 0;
        let mut sum = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in dataset.values(column) {
            present += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        // No present values: leave the extremes unset instead of ±inf
        let (min, max, mean) = if present > 0 {
            (Some(min), Some(max), Some(sum / present as f64))
        } else {
            (None, None, None)
        };

        ColumnSummary {
            column,
            present,
            missing: dataset.len() - present,
            min,
            max,
            mean,
        }
    }
}

impl Default for DatasetAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

impl DatasetSummary {
    pub fn summary(&self) -> String {
        let range = match self.date_range {
            Some((start, end)) => format!(
                "{} to {} ({} days)",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M"),
                end.signed_duration_since(start).num_days()
            ),
            None => "No records".to_string(),
        };

        let weather = if self.has_weather_column {
            format!("present ({} coded records)", self.weather_coded_records)
        } else {
            "absent (weather filter disabled)".to_string()
        };

        format!(
            "Records: {}\n\
            Date Range: {}\n\
            Weather Column: {}",
            self.total_records, range, weather
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut lines = vec![
            self.summary(),
            String::new(),
            format!(
                "{:<8} {:>8} {:>9} {:>10} {:>10} {:>10}",
                "Column", "Present", "Missing%", "Min", "Max", "Mean"
            ),
        ];

        for c in &self.columns {
            lines.push(format!(
                "{:<8} {:>8} {:>8.1}% {:>10} {:>10} {:>10}",
                c.column.header(),
                c.present,
                c.missing_percentage(),
                format_optional(c.min),
                format_optional(c.max),
                format_optional(c.mean),
            ));
        }

        lines.join("\n")
    }
}
