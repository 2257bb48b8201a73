pub mod analyzers;
pub mod cache;
pub mod cli;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod report;
pub mod settings;
pub mod utils;
pub mod writers;

pub use error::{LoadError, ReportError, Result};
