use crate::models::{FilterCriteria, Season, WeatherCategory};
use crate::report::{JsonRenderer, Renderer, TextRenderer};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "air-quality-report")]
#[command(about = "Explore an hourly air-quality dataset with date, season and weather filters")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short,
        long,
        global = true,
        help = "Dataset CSV or zip archive [default: clean_df_all.csv]"
    )]
    pub data: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file [default: air-quality.toml if present]"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the Home page
    Home,

    /// Preview the dataset with per-column statistics
    View {
        #[arg(short, long, help = "Rows to preview [default: preview_rows setting]")]
        rows: Option<usize>,
    },

    /// Filtered preview and mean NO2, CO and PM2.5
    Analyze {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Charts over the filtered data
    Visualize {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show the conclusions
    Conclusion,

    /// Show a page by menu name
    Page {
        name: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Write the filtered dataset to a Parquet file
    Export {
        #[arg(
            short,
            long,
            help = "Output Parquet file path [default: output/air-quality-{YYMMDD}.parquet]"
        )]
        output: Option<PathBuf>,

        #[arg(long, default_value = "snappy")]
        compression: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Start an interactive session
    Interactive,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long, help = "First day, YYYY-MM-DD [default: dataset start]")]
    pub start: Option<NaiveDate>,

    #[arg(long, help = "Last day, YYYY-MM-DD [default: dataset end]")]
    pub end: Option<NaiveDate>,

    #[arg(long, help = "all, winter, spring, summer or autumn")]
    pub season: Option<Season>,

    #[arg(long, help = "all, clear, cloudy or rainy")]
    pub weather: Option<WeatherCategory>,
}

impl FilterArgs {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.season.is_none()
            && self.weather.is_none()
    }

    /// Override `base` with whichever filters were given.
    pub fn apply(&self, base: FilterCriteria) -> FilterCriteria {
        let mut criteria = base;
        if let Some(start) = self.start {
            criteria = criteria.with_start_date(start);
        }
        if let Some(end) = self.end {
            criteria = criteria.with_end_date(end);
        }
        if let Some(season) = self.season {
            criteria = criteria.with_season(season);
        }
        if let Some(weather) = self.weather {
            criteria = criteria.with_weather(weather);
        }
        criteria
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            OutputFormat::Text => Box::new(TextRenderer::new()),
            OutputFormat::Json => Box::new(JsonRenderer),
        }
    }
}
