use crate::cache::DatasetCache;
use crate::cli::args::OutputFormat;
use crate::error::{ReportError, Result};
use crate::models::{Dataset, FilterCriteria, Season, WeatherCategory};
use crate::processors::DatasetView;
use crate::report::{DataSource, Page, PageReport, ReportBuilder};
use crate::settings::Settings;
use crate::utils::constants::DATE_FORMAT;
use chrono::NaiveDate;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

const HELP: &str = "\
Commands:
  page <name>       home, view, analyze, visualization, conclusion
  start <date>      first day, YYYY-MM-DD
  end <date>        last day, YYYY-MM-DD
  season <name>     all, winter, spring, summer, autumn
  weather <name>    all, clear, cloudy, rainy
  reset             clear the date, season and weather filters
  reload            read the dataset again
  show              render the current page
  help              this text
  quit              leave the session";

/// One line of input in an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Page(String),
    Start(NaiveDate),
    End(NaiveDate),
    Season(Season),
    Weather(WeatherCategory),
    Reset,
    Reload,
    Show,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = ReportError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (line, None),
        };

        let required = |arg: Option<_>| {
            arg.filter(|a: &&str| !a.is_empty())
                .ok_or_else(|| ReportError::Command(format!("'{}' needs an argument", name)))
        };
        let date = |arg| -> Result<NaiveDate> {
            Ok(NaiveDate::parse_from_str(required(arg)?, DATE_FORMAT)?)
        };

        match name.to_ascii_lowercase().as_str() {
            "page" | "go" => Ok(SessionCommand::Page(required(arg)?.to_string())),
            "start" => Ok(SessionCommand::Start(date(arg)?)),
            "end" => Ok(SessionCommand::End(date(arg)?)),
            "season" => Ok(SessionCommand::Season(required(arg)?.parse()?)),
            "weather" => Ok(SessionCommand::Weather(required(arg)?.parse()?)),
            "reset" => Ok(SessionCommand::Reset),
            "reload" => Ok(SessionCommand::Reload),
            "show" => Ok(SessionCommand::Show),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
            _ => Err(ReportError::unknown("command", name)),
        }
    }
}

/// State of one user session: settings, the dataset cache, the current page
/// and the current filter selection.
pub struct ReportSession {
    settings: Settings,
    cache: DatasetCache,
    view: Option<DatasetView>,
    load_error: Option<String>,
    page: Page,
    criteria: Option<FilterCriteria>,
    format: OutputFormat,
}

impl ReportSession {
    pub fn new(settings: Settings) -> Self {
        let cache = DatasetCache::new(settings.reader());
        Self {
            settings,
            cache,
            view: None,
            load_error: None,
            page: Page::Home,
            criteria: None,
            format: OutputFormat::Text,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Suppress the loading spinner.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.cache = self.cache.with_quiet(quiet);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_preview_rows(&mut self, rows: usize) {
        self.settings.preview_rows = rows.max(1);
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn criteria(&self) -> Option<&FilterCriteria> {
        self.criteria.as_ref()
    }

    pub fn set_criteria(&mut self, criteria: Option<FilterCriteria>) {
        self.criteria = criteria;
    }

    pub fn view(&self) -> Option<&DatasetView> {
        self.view.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Dataset at the configured path, read on a blocking worker on first use
    /// or when the file changed. A failure empties the cache.
    pub async fn fetch(&mut self) -> Result<Arc<Dataset>> {
        let path = self.settings.data_path.clone();
        self.cache.get_or_load_async(&path).await
    }

    /// Refresh the view from the cache. Load failures are kept as a reason
    /// shown on data pages instead of being returned.
    pub async fn refresh(&mut self) {
        match self.fetch().await {
            Ok(dataset) => {
                let unchanged = self
                    .view
                    .as_ref()
                    .is_some_and(|v| std::ptr::eq(v.dataset(), dataset.as_ref()));
                if !unchanged {
                    self.view = Some(
                        DatasetView::new(dataset)
                            .with_filter(self.settings.filter())
                            .with_aggregator(self.settings.aggregator()),
                    );
                }
                self.load_error = None;
            }
            Err(e) => {
                warn!(error = %e, "dataset unavailable");
                self.view = None;
                self.load_error = Some(e.to_string());
            }
        }
    }

    pub async fn reload(&mut self) {
        self.cache.invalidate();
        self.view = None;
        self.refresh().await;
    }

    pub fn build(&self, page: Page) -> PageReport {
        let data = match &self.view {
            Some(view) => DataSource::Loaded(view),
            None => DataSource::Unavailable(
                self.load_error
                    .clone()
                    .unwrap_or_else(|| "dataset not loaded".to_string()),
            ),
        };
        ReportBuilder::new(&self.settings.home, self.settings.preview_rows).build(
            page,
            &data,
            self.criteria.as_ref(),
        )
    }

    pub fn render(&self, report: &PageReport) -> Result<String> {
        self.format.renderer().render(report)
    }

    /// Load if needed, then build and render `page`.
    pub async fn show(&mut self, page: Page) -> Result<String> {
        self.page = page;
        if page.requires_data() {
            self.refresh().await;
        }
        self.render(&self.build(page))
    }

    /// Current criteria, or the whole-dataset default.
    fn base_criteria(&self) -> Result<FilterCriteria> {
        self.criteria
            .or_else(|| self.view.as_ref().and_then(|v| v.default_criteria()))
            .ok_or_else(|| ReportError::Command("no dataset loaded to filter".to_string()))
    }

    /// Apply one command. Returns the text to print, or `None` to quit.
    pub async fn execute(&mut self, command: SessionCommand) -> Result<Option<String>> {
        let output = match command {
            SessionCommand::Quit => return Ok(None),
            SessionCommand::Help => HELP.to_string(),
            SessionCommand::Page(name) => match name.parse::<Page>() {
                Ok(page) => self.show(page).await?,
                Err(_) => self.render(&PageReport::unavailable(&name))?,
            },
            SessionCommand::Show => self.show(self.page).await?,
            SessionCommand::Reset => {
                self.criteria = None;
                self.show(self.page).await?
            }
            SessionCommand::Reload => {
                self.reload().await;
                self.render(&self.build(self.page))?
            }
            SessionCommand::Start(_)
            | SessionCommand::End(_)
            | SessionCommand::Season(_)
            | SessionCommand::Weather(_) => {
                self.refresh().await;
                let base = self.base_criteria()?;
                self.criteria = Some(match command {
                    SessionCommand::Start(date) => base.with_start_date(date),
                    SessionCommand::End(date) => base.with_end_date(date),
                    SessionCommand::Season(season) => base.with_season(season),
                    SessionCommand::Weather(weather) => base.with_weather(weather),
                    _ => base,
                });
                self.show(self.page).await?
            }
        };
        Ok(Some(output))
    }

    /// Read commands line by line until `quit` or end of input. Errors are
    /// printed and the loop continues.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "{}", self.show(Page::Home).await?)?;
        writeln!(out, "{}", HELP)?;

        let mut lines = input.lines();
        loop {
            write!(out, "[{}] > ", self.page)?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let result = match line.parse::<SessionCommand>() {
                Ok(command) => self.execute(command).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(Some(text)) => writeln!(out, "{}", text)?,
                Ok(None) => break,
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const CSV: &str = "\
date_time,PM2.5,NO2,CO,weathersit
2016-01-05 00:00:00,80,50,1200,1
2016-04-05 00:00:00,40,30,700,2
2016-07-05 00:00:00,20,20,500,3
2016-10-05 00:00:00,60,40,900,1
";

    fn csv_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn session(path: &std::path::Path) -> ReportSession {
        let settings = Settings {
            data_path: path.to_path_buf(),
            ..Settings::default()
        };
        ReportSession::new(settings).with_quiet(true)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "season Winter".parse::<SessionCommand>().unwrap(),
            SessionCommand::Season(Season::Winter)
        );
        assert_eq!(
            "start 2016-03-01".parse::<SessionCommand>().unwrap(),
            SessionCommand::Start(NaiveDate::from_ymd_opt(2016, 3, 1).unwrap())
        );
        assert_eq!(
            "page view dataset".parse::<SessionCommand>().unwrap(),
            SessionCommand::Page("view dataset".to_string())
        );
        assert_eq!("QUIT".parse::<SessionCommand>().unwrap(), SessionCommand::Quit);
        assert!("start".parse::<SessionCommand>().is_err());
        assert!("start 03/01/2016".parse::<SessionCommand>().is_err());
        assert!("weather foggy".parse::<SessionCommand>().is_err());
        assert!("dance".parse::<SessionCommand>().is_err());
    }

    #[tokio::test]
    async fn test_filters_update_criteria() {
        let file = csv_file();
        let mut session = session(file.path());

        session
            .execute(SessionCommand::Page("analyze".to_string()))
            .await
            .unwrap();
        session
            .execute(SessionCommand::Season(Season::Summer))
            .await
            .unwrap();
        let criteria = *session.criteria().unwrap();
        assert_eq!(criteria.season, Season::Summer);
        assert_eq!(
            criteria.date_range.start,
            NaiveDate::from_ymd_opt(2016, 1, 5).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );

        let text = session.execute(SessionCommand::Reset).await.unwrap().unwrap();
        assert!(session.criteria().is_none());
        assert!(text.contains("Season: All"));
    }

    #[tokio::test]
    async fn test_missing_file_keeps_session_usable() {
        let mut session = session(std::path::Path::new("/nonexistent/air.csv"));

        let view = session.show(Page::ViewDataset).await.unwrap();
        assert!(view.contains("Data could not be loaded"));
        assert!(session.load_error().is_some());

        let home = session.show(Page::Home).await.unwrap();
        assert!(home.contains("Air Quality Analysis Dashboard"));

        let err = session
            .execute(SessionCommand::Season(Season::Winter))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Command(_)));
    }

    #[tokio::test]
    async fn test_run_loop_reports_errors_and_quits() {
        let file = csv_file();
        let mut session = session(file.path());
        let input: &[u8] = b"dance\npage settings\npage conclusion\nquit\npage home\n";
        let mut out = Vec::new();

        session.run(input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error: Unknown command: 'dance'"));
        assert!(text.contains("Menu 'settings' is not available yet."));
        assert!(text.contains("Findings from the data analysis:"));
        assert_eq!(session.page(), Page::Conclusion);
    }

    #[tokio::test]
    async fn test_view_reused_between_pages() {
        let file = csv_file();
        let mut session = session(file.path());

        session.show(Page::ViewDataset).await.unwrap();
        let first = Arc::clone(&session.fetch().await.unwrap());
        session.show(Page::Visualization).await.unwrap();
        let second = session.fetch().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 4);
    }
}
