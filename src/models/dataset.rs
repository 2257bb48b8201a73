use chrono::NaiveDateTime;
use std::collections::BTreeSet;

use crate::models::{AirQualityRecord, Column};

/// An ordered collection of observations plus the schema it was read with.
///
/// Records are not sorted and timestamps may repeat. Filtering produces a new
/// `Dataset` sharing the schema; the source is never modified.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    records: Vec<AirQualityRecord>,
    columns: BTreeSet<Column>,
    has_weather: bool,
}

impl Dataset {
    pub fn new(
        records: Vec<AirQualityRecord>,
        columns: BTreeSet<Column>,
        has_weather: bool,
    ) -> Self {
        Self {
            records,
            columns,
            has_weather,
        }
    }

    /// Dataset with every measurement column and the weather column present.
    pub fn with_full_schema(records: Vec<AirQualityRecord>) -> Self {
        Self::new(records, Column::ALL.into_iter().collect(), true)
    }

    /// New dataset with the same schema holding `records`.
    pub fn derive(&self, records: Vec<AirQualityRecord>) -> Self {
        Self {
            records,
            columns: self.columns.clone(),
            has_weather: self.has_weather,
        }
    }

    pub fn records(&self) -> &[AirQualityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Whether the source carried a `weathersit` column.
    pub fn has_weather_column(&self) -> bool {
        self.has_weather
    }

    pub fn head(&self, n: usize) -> &[AirQualityRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Earliest and latest timestamp, `None` when empty.
    pub fn time_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.records.first()?.date_time;
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            (lo.min(r.date_time), hi.max(r.date_time))
        }))
    }

    /// Present values of `column`, in record order.
    pub fn values(&self, column: Column) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().filter_map(move |r| r.value(column))
    }

    /// Concatenate datasets, keeping only the columns every part has.
    pub fn concat(parts: Vec<Dataset>) -> Dataset {
        let mut parts = parts.into_iter();
        let Some(mut merged) = parts.next() else {
            return Dataset::default();
        };

        for part in parts {
            merged.columns = merged
                .columns
                .intersection(&part.columns)
                .copied()
                .collect();
            merged.has_weather &= part.has_weather;
            merged.records.extend(part.records);
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, month, day)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_time_bounds_unsorted() {
        let dataset = Dataset::with_full_schema(vec![
            AirQualityRecord::new(at(5, 1)),
            AirQualityRecord::new(at(2, 9)),
            AirQualityRecord::new(at(11, 30)),
        ]);

        assert_eq!(dataset.time_bounds(), Some((at(2, 9), at(11, 30))));
        assert_eq!(Dataset::default().time_bounds(), None);
    }

    #[test]
    fn test_head_and_values() {
        let dataset = Dataset::with_full_schema(vec![
            AirQualityRecord::builder(at(1, 1))
                .value(Column::Pm25, 10.0)
                .build(),
            AirQualityRecord::new(at(1, 2)),
            AirQualityRecord::builder(at(1, 3))
                .value(Column::Pm25, 30.0)
                .build(),
        ]);

        assert_eq!(dataset.head(2).len(), 2);
        assert_eq!(dataset.head(10).len(), 3);
        assert_eq!(
            dataset.values(Column::Pm25).collect::<Vec<_>>(),
            vec![10.0, 30.0]
        );
    }

    #[test]
    fn test_concat_intersects_schema() {
        let a = Dataset::with_full_schema(vec![AirQualityRecord::new(at(1, 1))]);
        let b = Dataset::new(
            vec![AirQualityRecord::new(at(1, 2))],
            Column::REQUIRED.into_iter().collect(),
            false,
        );

        let merged = Dataset::concat(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert!(!merged.has_weather_column());
        assert!(!merged.has_column(Column::Rain));
        assert!(merged.has_column(Column::Co));
    }
}
