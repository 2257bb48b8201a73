pub mod dataset_analyzer;

pub use dataset_analyzer::{ColumnSummary, DatasetAnalyzer, DatasetSummary};
