use chrono::{Datelike, Local, NaiveDate};
use std::path::PathBuf;

/// Default export path: `output/air-quality-{YYMMDD}.parquet` for today.
pub fn generate_default_parquet_filename() -> PathBuf {
    parquet_filename_for(Local::now().date_naive())
}

pub fn parquet_filename_for(date: NaiveDate) -> PathBuf {
    let filename = format!(
        "air-quality-{:02}{:02}{:02}.parquet",
        date.year() % 100,
        date.month(),
        date.day()
    );
    PathBuf::from("output").join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parquet_filename_for_date() {
        let date = NaiveDate::from_ymd_opt(2017, 2, 28).unwrap();
        assert_eq!(
            parquet_filename_for(date),
            PathBuf::from("output").join("air-quality-170228.parquet")
        );
    }

    #[test]
    fn test_generate_default_parquet_filename() {
        let filename = generate_default_parquet_filename();
        let filename_str = filename.to_string_lossy();

        assert!(filename_str.starts_with("output"));
        assert!(filename_str.ends_with(".parquet"));
        assert!(filename
            .file_name()
            .is_some_and(|f| f.to_string_lossy().starts_with("air-quality-")));
    }
}
