pub mod aggregator;
pub mod filter;
pub mod view;

pub use aggregator::{
    Aggregator, BucketValues, FiveNumberSummary, HistogramBin, MonthlyMeans, RainBucket,
    ScatterSeries,
};
pub use filter::DatasetFilter;
pub use view::DatasetView;
