use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// Numeric measurement columns of the air-quality dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Pm25,
    Pm10,
    So2,
    No2,
    Co,
    O3,
    Wspm,
    Rain,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Pm25,
        Column::Pm10,
        Column::So2,
        Column::No2,
        Column::Co,
        Column::O3,
        Column::Wspm,
        Column::Rain,
    ];

    pub const POLLUTANTS: [Column; 6] = [
        Column::Pm25,
        Column::Pm10,
        Column::So2,
        Column::No2,
        Column::Co,
        Column::O3,
    ];

    /// Columns the loader refuses to work without.
    pub const REQUIRED: [Column; 3] = [Column::Pm25, Column::No2, Column::Co];

    /// Header name as written in the CSV file.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Pm25 => "PM2.5",
            Column::Pm10 => "PM10",
            Column::So2 => "SO2",
            Column::No2 => "NO2",
            Column::Co => "CO",
            Column::O3 => "O3",
            Column::Wspm => "WSPM",
            Column::Rain => "RAIN",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Column::ALL
            .into_iter()
            .find(|c| c.header().eq_ignore_ascii_case(header.trim()))
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Column::Pm25 => "PM2.5",
            Column::Pm10 => "PM10",
            Column::So2 => "Sulphur Dioxide (SO2)",
            Column::No2 => "Nitrogen Dioxide (NO2)",
            Column::Co => "Carbon Monoxide (CO)",
            Column::O3 => "Ozone (O3)",
            Column::Wspm => "Wind Speed",
            Column::Rain => "Rainfall",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            Column::Wspm => "m/s",
            Column::Rain => "mm",
            _ => "µg/m³",
        }
    }

    pub fn is_pollutant(&self) -> bool {
        Column::POLLUTANTS.contains(self)
    }

    pub fn is_required(&self) -> bool {
        Column::REQUIRED.contains(self)
    }

    pub fn axis_label(&self) -> String {
        format!("{} ({})", self.header(), self.units())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header())
    }
}

impl FromStr for Column {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::from_header(s)
            .or_else(|| match s.trim().to_ascii_lowercase().as_str() {
                "pm25" | "pm2_5" => Some(Column::Pm25),
                "wind" | "wind_speed" => Some(Column::Wspm),
                _ => None,
            })
            .ok_or_else(|| ReportError::unknown("column", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        for column in Column::ALL {
            assert_eq!(Column::from_header(column.header()), Some(column));
        }
        assert_eq!(Column::from_header(" pm2.5 "), Some(Column::Pm25));
        assert_eq!(Column::from_header("TEMP"), None);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("pm25".parse::<Column>().unwrap(), Column::Pm25);
        assert_eq!("wind".parse::<Column>().unwrap(), Column::Wspm);
        assert!("station".parse::<Column>().is_err());
    }

    #[test]
    fn test_column_groups() {
        assert!(Column::Pm25.is_required());
        assert!(!Column::O3.is_required());
        assert!(Column::O3.is_pollutant());
        assert!(!Column::Rain.is_pollutant());
        assert_eq!(Column::Wspm.axis_label(), "WSPM (m/s)");
    }
}
