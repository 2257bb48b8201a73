pub mod archive_reader;
pub mod csv_reader;

pub use archive_reader::ArchiveReader;
pub use csv_reader::{parse_timestamp, DatasetReader};
