pub mod column;
pub mod criteria;
pub mod dataset;
pub mod record;

pub use column::Column;
pub use criteria::{DateRange, FilterCriteria, Season, WeatherCategory, WeatherCodes};
pub use dataset::Dataset;
pub use record::{AirQualityRecord, AirQualityRecordBuilder};
