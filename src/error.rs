use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

/// Failures while bringing a dataset into memory. Reported to the user; the
/// session keeps running with no dataset loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File {} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("Required column '{column}' missing from {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("Row {row}: cannot parse '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: {message}")]
    OutOfRange { row: usize, message: String },

    #[error("Malformed CSV in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Archive {} contains no CSV members", path.display())]
    EmptyArchive { path: PathBuf },

    #[error("Archive {} is unreadable: {source}", path.display())]
    CorruptArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Failed to load dataset: {0}")]
    Load(#[from] LoadError),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("Invalid command: {0}")]
    Command(String),

    #[error("Unknown {kind}: '{value}'")]
    UnknownSelection { kind: &'static str, value: String },

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ReportError {
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        ReportError::UnknownSelection {
            kind,
            value: value.into(),
        }
    }

    pub fn is_load_error(&self) -> bool {
        matches!(self, ReportError::Load(_))
    }
}
