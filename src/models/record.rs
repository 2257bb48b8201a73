use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{LoadError, Result};
use crate::models::Column;

/// One timestamped observation. Every measurement may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AirQualityRecord {
    pub date_time: NaiveDateTime,

    // Pollutant concentrations (µg/m³)
    #[validate(range(min = 0.0))]
    pub pm25: Option<f64>,

    #[validate(range(min = 0.0))]
    pub pm10: Option<f64>,

    #[validate(range(min = 0.0))]
    pub so2: Option<f64>,

    #[validate(range(min = 0.0))]
    pub no2: Option<f64>,

    #[validate(range(min = 0.0))]
    pub co: Option<f64>,

    #[validate(range(min = 0.0))]
    pub o3: Option<f64>,

    // Meteorology
    pub wspm: Option<f64>,
    pub rain: Option<f64>,

    /// Weather situation code, 1=Clear 2=Cloudy 3=Rainy with default settings
    pub weathersit: Option<u8>,
}

impl AirQualityRecord {
    pub fn new(date_time: NaiveDateTime) -> Self {
        Self {
            date_time,
            pm25: None,
            pm10: None,
            so2: None,
            no2: None,
            co: None,
            o3: None,
            wspm: None,
            rain: None,
            weathersit: None,
        }
    }

    pub fn builder(date_time: NaiveDateTime) -> AirQualityRecordBuilder {
        AirQualityRecordBuilder::new(date_time)
    }

    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Pm25 => self.pm25,
            Column::Pm10 => self.pm10,
            Column::So2 => self.so2,
            Column::No2 => self.no2,
            Column::Co => self.co,
            Column::O3 => self.o3,
            Column::Wspm => self.wspm,
            Column::Rain => self.rain,
        }
    }

    pub fn set_value(&mut self, column: Column, value: Option<f64>) {
        let slot = match column {
            Column::Pm25 => &mut self.pm25,
            Column::Pm10 => &mut self.pm10,
            Column::So2 => &mut self.so2,
            Column::No2 => &mut self.no2,
            Column::Co => &mut self.co,
            Column::O3 => &mut self.o3,
            Column::Wspm => &mut self.wspm,
            Column::Rain => &mut self.rain,
        };
        *slot = value;
    }

    pub fn month(&self) -> u32 {
        self.date_time.month()
    }

    /// Range checks on the pollutant fields, reported against a source row.
    pub fn validate_row(&self, row: usize) -> Result<()> {
        self.validate().map_err(|e| LoadError::OutOfRange {
            row,
            message: e.to_string(),
        })?;
        Ok(())
    }
}

pub struct AirQualityRecordBuilder {
    record: AirQualityRecord,
}

impl AirQualityRecordBuilder {
    pub fn new(date_time: NaiveDateTime) -> Self {
        Self {
            record: AirQualityRecord::new(date_time),
        }
    }

    pub fn value(mut self, column: Column, value: f64) -> Self {
        self.record.set_value(column, Some(value));
        self
    }

    pub fn weathersit(mut self, code: u8) -> Self {
        self.record.weathersit = Some(code);
        self
    }

    pub fn build(self) -> AirQualityRecord {
        self.record
    }
}
