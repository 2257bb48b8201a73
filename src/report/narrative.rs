//! Explanatory text attached to charts, keyed by the active season and
//! weather selection.

use crate::models::{FilterCriteria, Season, WeatherCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    PollutantMeans,
    Pm25Distribution,
    WindDispersion,
    MonthlyTraffic,
    RainWashout,
    OzoneFormation,
}

impl Topic {
    fn base(&self) -> &'static str {
        match self {
            Topic::PollutantMeans => {
                "Average concentrations of the main traffic and combustion pollutants \
                 for the selected period. CO is reported on a much larger scale than \
                 NO2 and PM2.5, so compare bars of the same pollutant across filters \
                 rather than across pollutants."
            }
            Topic::Pm25Distribution => {
                "PM2.5 readings are strongly right-skewed: most hours are moderate, \
                 while a long tail of pollution episodes pulls the mean above the median."
            }
            Topic::WindDispersion => {
                "Wind disperses particulate matter. Hours with higher wind speed \
                 tend to show lower PM2.5 concentrations."
            }
            Topic::MonthlyTraffic => {
                "Monthly mean NO2 and CO track vehicle and heating activity; both \
                 climb in the colder months when emissions rise and the boundary layer \
                 is shallow."
            }
            Topic::RainWashout => {
                "Light and moderate rain wash particles out of the air and lower PM2.5, \
                 but the heavy-rain bucket holds few hours and can show higher values."
            }
            Topic::OzoneFormation => {
                "O3 is a secondary pollutant. NO2 and CO take part in its formation \
                 and destruction, so their relation to O3 is usually negative near \
                 emission sources."
            }
        }
    }

    /// Base text, then a sentence for the active season and weather.
    pub fn compose(&self, criteria: &FilterCriteria, facts: Option<String>) -> String {
        let mut parts = vec![self.base().to_string()];
        if let Some(note) = season_note(criteria.season) {
            parts.push(note.to_string());
        }
        if let Some(note) = weather_note(criteria.weather) {
            parts.push(note.to_string());
        }
        if let Some(facts) = facts {
            parts.push(facts);
        }
        parts.join(" ")
    }
}

fn season_note(season: Season) -> Option<&'static str> {
    match season {
        Season::All => None,
        Season::Winter => Some(
            "Winter: coal heating and temperature inversions keep pollutants near \
             the ground, so concentrations are at their highest.",
        ),
        Season::Spring => Some(
            "Spring: stronger winds and dust events make PM10 and PM2.5 more variable.",
        ),
        Season::Summer => Some(
            "Summer: frequent rain and deeper mixing lower particulate levels, while \
             strong sunlight raises O3.",
        ),
        Season::Autumn => Some(
            "Autumn: concentrations rise again toward the end of the season as \
             heating begins.",
        ),
    }
}

fn weather_note(weather: WeatherCategory) -> Option<&'static str> {
    match weather {
        WeatherCategory::All => None,
        WeatherCategory::Clear => {
            Some("Clear conditions only: stable air can let pollutants accumulate.")
        }
        WeatherCategory::Cloudy => Some("Cloudy conditions only."),
        WeatherCategory::Rainy => {
            Some("Rainy conditions only: wet deposition removes part of the particulate load.")
        }
    }
}

/// Plain-language strength of a correlation coefficient.
pub fn describe_correlation(r: f64) -> String {
    let strength = match r.abs() {
        a if a >= 0.7 => "strong",
        a if a >= 0.4 => "moderate",
        a if a >= 0.2 => "weak",
        _ => "negligible",
    };
    let direction = if r < 0.0 { "negative" } else { "positive" };
    format!("{} {} correlation (r = {:.2})", strength, direction, r)
}

pub const CONCLUSIONS: [&str; 4] = [
    "Wind speed (WSPM) plays a part in dispersing pollutants: \
     when the wind is strong, PM2.5 falls.",
    "NO2 and CO rise with motor vehicle activity.",
    "Rain helps lower PM2.5, although it can increase during heavy rain.",
    "NO2 and CO concentrations influence the formation of O3.",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateRange;
    use chrono::NaiveDate;

    fn criteria() -> FilterCriteria {
        let day = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        FilterCriteria::new(DateRange::from_dates(day, day))
    }

    #[test]
    fn test_compose_keyed_by_selection() {
        let plain = Topic::WindDispersion.compose(&criteria(), None);
        assert!(!plain.contains("Winter"));

        let winter = Topic::WindDispersion.compose(
            &criteria()
                .with_season(Season::Winter)
                .with_weather(WeatherCategory::Rainy),
            Some("extra".to_string()),
        );
        assert!(winter.starts_with(plain.as_str()));
        assert!(winter.contains("Winter:"));
        assert!(winter.contains("Rainy conditions"));
        assert!(winter.ends_with("extra"));
    }

    #[test]
    fn test_describe_correlation() {
        assert_eq!(
            describe_correlation(-0.45),
            "moderate negative correlation (r = -0.45)"
        );
        assert!(describe_correlation(0.9).starts_with("strong positive"));
        assert!(describe_correlation(0.05).starts_with("negligible"));
    }
}
