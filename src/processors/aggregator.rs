use crate::models::{Column, Dataset};
use crate::utils::constants::{DEFAULT_HISTOGRAM_BINS, MAX_HISTOGRAM_BINS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Month number (1-12) to per-column mean. Months without rows are absent.
pub type MonthlyMeans = BTreeMap<u32, BTreeMap<Column, f64>>;

/// A rain-intensity bucket covering `(previous upper, upper]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainBucket {
    pub label: String,
    pub upper: f64,
}

impl RainBucket {
    pub fn new(label: impl Into<String>, upper: f64) -> Self {
        Self {
            label: label.into(),
            upper,
        }
    }

    /// (0,1] No Rain, (1,4] Light, (4,8] Moderate, (8,10] Heavy.
    pub fn defaults() -> Vec<RainBucket> {
        vec![
            RainBucket::new("No Rain", 1.0),
            RainBucket::new("Light Rain", 4.0),
            RainBucket::new("Moderate Rain", 8.0),
            RainBucket::new("Heavy Rain", 10.0),
        ]
    }
}

/// Values of one column that fell into a rain bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketValues {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub values: Vec<f64>,
}

impl BucketValues {
    pub fn summary(&self) -> Option<FiveNumberSummary> {
        FiveNumberSummary::from_values(&self.values)
    }
}

/// Minimum, quartiles and maximum, as drawn by a box plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

impl FiveNumberSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            count: sorted.len(),
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Linear interpolation between closest ranks over sorted input.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub x: Column,
    pub y: Column,
    pub points: Vec<(f64, f64)>,
    pub correlation: Option<f64>,
}

/// Grouped and binned summaries over an already-filtered dataset.
#[derive(Debug, Clone)]
pub struct Aggregator {
    rain_buckets: Vec<RainBucket>,
    histogram_bins: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            rain_buckets: RainBucket::defaults(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }

    pub fn with_rain_buckets(mut self, rain_buckets: Vec<RainBucket>) -> Self {
        self.rain_buckets = rain_buckets;
        self
    }

    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins.clamp(1, MAX_HISTOGRAM_BINS);
        self
    }

    pub fn rain_buckets(&self) -> &[RainBucket] {
        &self.rain_buckets
    }

    /// Mean of each requested column per calendar month, ignoring missing
    /// values. A month with no present value for a column omits that column.
    pub fn aggregate_by_month(&self, dataset: &Dataset, columns: &[Column]) -> MonthlyMeans {
        let mut sums: BTreeMap<u32, BTreeMap<Column, (f64, usize)>> = BTreeMap::new();

        for record in dataset.records() {
            let month = sums.entry(record.month()).or_default();
            for column in columns {
                if let Some(value) = record.value(*column) {
                    let slot = month.entry(*column).or_insert((0.0, 0));
                    slot.0 += value;
                    slot.1 += 1;
                }
            }
        }

        sums.into_iter()
            .map(|(month, by_column)| {
                let means = by_column
                    .into_iter()
                    .map(|(column, (sum, n))| (column, sum / n as f64))
                    .collect();
                (month, means)
            })
            .collect()
    }

    /// Mean of each column over the whole dataset; `None` where no value is
    /// present.
    pub fn column_means(
        &self,
        dataset: &Dataset,
        columns: &[Column],
    ) -> Vec<(Column, Option<f64>)> {
        columns
            .iter()
            .map(|column| (*column, mean(dataset.values(*column))))
            .collect()
    }

    /// Assign each record to a rain bucket by its RAIN value and collect the
    /// present values of `column`. Rain outside `(0, last upper]` or missing
    /// falls in no bucket.
    pub fn bucket_by_rain(&self, dataset: &Dataset, column: Column) -> Vec<BucketValues> {
        let mut buckets: Vec<BucketValues> = self
            .rain_buckets
            .iter()
            .scan(0.0, |lower, bucket| {
                let values = BucketValues {
                    label: bucket.label.clone(),
                    lower: *lower,
                    upper: bucket.upper,
                    values: Vec::new(),
                };
                *lower = bucket.upper;
                Some(values)
            })
            .collect();

        for record in dataset.records() {
            let (Some(rain), Some(value)) = (record.rain, record.value(column)) else {
                continue;
            };

            if let Some(bucket) = buckets
                .iter_mut()
                .find(|b| rain > b.lower && rain <= b.upper)
            {
                bucket.values.push(value);
            }
        }

        buckets
    }

    /// Equal-width histogram over the present values of `column`.
    pub fn histogram(&self, dataset: &Dataset, column: Column) -> Vec<HistogramBin> {
        let values: Vec<f64> = dataset.values(column).collect();
        histogram(&values, self.histogram_bins)
    }

    pub fn scatter(&self, dataset: &Dataset, x: Column, y: Column) -> ScatterSeries {
        let points: Vec<(f64, f64)> = dataset
            .records()
            .iter()
            .filter_map(|r| Some((r.value(x)?, r.value(y)?)))
            .collect();

        ScatterSeries {
            x,
            y,
            correlation: pearson(&points),
            points,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Equal-width bins between the smallest and largest finite value.
/// Non-finite values are not counted.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);

    if max == min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let bins = bins.clamp(1, MAX_HISTOGRAM_BINS);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in &values {
        // The maximum lands in the last bin
        let idx = (((value - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// Pearson correlation; `None` for fewer than two points or zero variance.
pub fn pearson(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
