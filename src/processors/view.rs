use crate::models::{Column, Dataset, FilterCriteria};
use crate::processors::aggregator::{
    Aggregator, BucketValues, HistogramBin, MonthlyMeans, ScatterSeries,
};
use crate::processors::filter::DatasetFilter;
use std::sync::Arc;

/// Read-only handle on a loaded dataset with the filter and aggregation
/// settings of the session. Every method is a pure transform; the shared
/// dataset is never modified.
#[derive(Debug, Clone)]
pub struct DatasetView {
    dataset: Arc<Dataset>,
    filter: DatasetFilter,
    aggregator: Aggregator,
}

impl DatasetView {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            filter: DatasetFilter::new(),
            aggregator: Aggregator::new(),
        }
    }

    pub fn with_filter(mut self, filter: DatasetFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Criteria covering the whole dataset, `None` when it is empty.
    pub fn default_criteria(&self) -> Option<FilterCriteria> {
        FilterCriteria::for_dataset(&self.dataset)
    }

    pub fn weather_filter_available(&self) -> bool {
        self.filter.weather_filter_available(&self.dataset)
    }

    pub fn filter(&self, criteria: &FilterCriteria) -> Dataset {
        self.filter.apply(&self.dataset, criteria)
    }

    pub fn aggregate_by_month(&self, dataset: &Dataset, columns: &[Column]) -> MonthlyMeans {
        self.aggregator.aggregate_by_month(dataset, columns)
    }

    pub fn bucket_by_rain(&self, dataset: &Dataset, column: Column) -> Vec<BucketValues> {
        self.aggregator.bucket_by_rain(dataset, column)
    }

    pub fn column_means(
        &self,
        dataset: &Dataset,
        columns: &[Column],
    ) -> Vec<(Column, Option<f64>)> {
        self.aggregator.column_means(dataset, columns)
    }

    pub fn histogram(&self, dataset: &Dataset, column: Column) -> Vec<HistogramBin> {
        self.aggregator.histogram(dataset, column)
    }

    pub fn scatter(&self, dataset: &Dataset, x: Column, y: Column) -> ScatterSeries {
        self.aggregator.scatter(dataset, x, y)
    }
}
