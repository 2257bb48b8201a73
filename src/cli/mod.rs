pub mod args;
pub mod commands;
pub mod session;

pub use args::{Cli, Commands, FilterArgs, OutputFormat};
pub use commands::run;
pub use session::{ReportSession, SessionCommand};
