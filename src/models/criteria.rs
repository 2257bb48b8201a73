use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;
use crate::models::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Season {
    #[default]
    All,
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const OPTIONS: [Season; 5] = [
        Season::All,
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Autumn,
    ];

    /// Calendar months belonging to the season. Empty for `All`.
    pub fn months(&self) -> &'static [u32] {
        match self {
            Season::All => &[],
            Season::Winter => &[12, 1, 2],
            Season::Spring => &[3, 4, 5],
            Season::Summer => &[6, 7, 8],
            Season::Autumn => &[9, 10, 11],
        }
    }

    pub fn contains_month(&self, month: u32) -> bool {
        match self {
            Season::All => true,
            _ => self.months().contains(&month),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::All => "All",
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Season {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Season::All),
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" | "fall" => Ok(Season::Autumn),
            _ => Err(ReportError::unknown("season", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeatherCategory {
    #[default]
    All,
    Clear,
    Cloudy,
    Rainy,
}

impl WeatherCategory {
    pub const OPTIONS: [WeatherCategory; 4] = [
        WeatherCategory::All,
        WeatherCategory::Clear,
        WeatherCategory::Cloudy,
        WeatherCategory::Rainy,
    ];

    /// Integer code of the category under `codes`, `None` for `All`.
    pub fn code(&self, codes: &WeatherCodes) -> Option<u8> {
        match self {
            WeatherCategory::All => None,
            WeatherCategory::Clear => Some(codes.clear),
            WeatherCategory::Cloudy => Some(codes.cloudy),
            WeatherCategory::Rainy => Some(codes.rainy),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeatherCategory::All => "All",
            WeatherCategory::Clear => "Clear",
            WeatherCategory::Cloudy => "Cloudy",
            WeatherCategory::Rainy => "Rainy",
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for WeatherCategory {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(WeatherCategory::All),
            "clear" => Ok(WeatherCategory::Clear),
            "cloudy" => Ok(WeatherCategory::Cloudy),
            "rainy" | "rain" => Ok(WeatherCategory::Rainy),
            _ => Err(ReportError::unknown("weather category", s)),
        }
    }
}

/// Mapping from weather category to the integer stored in `weathersit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCodes {
    pub clear: u8,
    pub cloudy: u8,
    pub rainy: u8,
}

impl Default for WeatherCodes {
    fn default() -> Self {
        Self {
            clear: 1,
            cloudy: 2,
            rainy: 3,
        }
    }
}

/// Inclusive timestamp range. `end < start` is allowed and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Both endpoints at midnight, as a date picker selection is interpreted.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(NaiveTime::MIN),
        }
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        self.start <= *timestamp && *timestamp <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub date_range: DateRange,
    pub season: Season,
    pub weather: WeatherCategory,
}

impl FilterCriteria {
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            season: Season::All,
            weather: WeatherCategory::All,
        }
    }

    /// Criteria spanning the whole dataset with every other filter off.
    /// `None` for an empty dataset.
    pub fn for_dataset(dataset: &Dataset) -> Option<Self> {
        dataset
            .time_bounds()
            .map(|(start, end)| Self::new(DateRange::new(start, end)))
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.season = season;
        self
    }

    pub fn with_weather(mut self, weather: WeatherCategory) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_start_date(mut self, start: NaiveDate) -> Self {
        self.date_range.start = start.and_time(NaiveTime::MIN);
        self
    }

    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.date_range.end = end.and_time(NaiveTime::MIN);
        self
    }

    pub fn describe(&self) -> String {
        format!(
            "Date range: {} | Season: {} | Weather: {}",
            self.date_range, self.season, self.weather
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_months() {
        assert_eq!(Season::Winter.months(), &[12, 1, 2]);
        assert!(Season::Winter.contains_month(1));
        assert!(!Season::Winter.contains_month(3));
        assert!(Season::All.contains_month(7));

        let covered: Vec<u32> = Season::OPTIONS
            .iter()
            .flat_map(|s| s.months().iter().copied())
            .collect();
        assert_eq!(covered.len(), 12);
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("Summer".parse::<Season>().unwrap(), Season::Summer);
        assert_eq!("fall".parse::<Season>().unwrap(), Season::Autumn);
        assert!("monsoon".parse::<Season>().is_err());
        assert_eq!(
            "RAINY".parse::<WeatherCategory>().unwrap(),
            WeatherCategory::Rainy
        );
        assert!("foggy".parse::<WeatherCategory>().is_err());
    }

    #[test]
    fn test_weather_codes() {
        let codes = WeatherCodes::default();
        assert_eq!(WeatherCategory::All.code(&codes), None);
        assert_eq!(WeatherCategory::Cloudy.code(&codes), Some(2));

        let custom = WeatherCodes {
            clear: 0,
            cloudy: 5,
            rainy: 9,
        };
        assert_eq!(WeatherCategory::Rainy.code(&custom), Some(9));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2015, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2015, 3, 31).unwrap();
        let range = DateRange::from_dates(start, end);

        assert!(range.contains(&start.and_hms_opt(0, 0, 0).unwrap()));
        assert!(range.contains(&end.and_hms_opt(0, 0, 0).unwrap()));
        assert!(!range.contains(&end.and_hms_opt(0, 0, 1).unwrap()));
        assert!(!range.is_inverted());
        assert!(DateRange::from_dates(end, start).is_inverted());
    }
}
