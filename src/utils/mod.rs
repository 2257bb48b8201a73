pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{generate_default_parquet_filename, parquet_filename_for};
pub use progress::ProgressReporter;
