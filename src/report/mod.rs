pub mod builder;
pub mod catalog;
pub mod chart;
pub mod narrative;
pub mod page;
pub mod render;

pub use builder::{Block, DataSource, Notice, PageReport, Preview, ReportBuilder};
pub use chart::{ChartData, ChartKind, ChartSpec};
pub use page::Page;
pub use render::{JsonRenderer, Renderer, TextRenderer};
