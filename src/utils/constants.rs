/// Column names with special handling in the CSV header
pub const DATE_TIME_COLUMN: &str = "date_time";
pub const WEATHER_COLUMN: &str = "weathersit";

/// File names
pub const DEFAULT_DATA_FILE: &str = "clean_df_all.csv";
pub const DEFAULT_CONFIG_FILE: &str = "air-quality.toml";
pub const ENV_PREFIX: &str = "AIRQ";

/// Cell values treated as missing
pub const MISSING_MARKERS: [&str; 5] = ["", "NA", "NaN", "nan", "null"];

/// Accepted timestamp layouts, tried in order
pub const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
/// Layouts with a UTC offset that RFC 3339 parsing does not cover
pub const OFFSET_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M%:z"];
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Report defaults
pub const DEFAULT_PREVIEW_ROWS: usize = 5;
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;
pub const MAX_HISTOGRAM_BINS: usize = 500;
pub const ASCII_BAR_WIDTH: usize = 40;

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 10000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const MMAP_THRESHOLD_BYTES: u64 = 64 * 1024 * 1024;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
