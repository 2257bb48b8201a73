use crate::cli::args::{Cli, Commands, FilterArgs, OutputFormat};
use crate::cli::session::ReportSession;
use crate::error::{ReportError, Result};
use crate::report::{Page, PageReport};
use crate::settings::Settings;
use crate::utils::filename::generate_default_parquet_filename;
use crate::writers::ParquetWriter;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::BufReader;
use tracing::{info, Level};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        settings.data_path = data;
    }

    let format = cli.format;
    let mut session = ReportSession::new(settings)
        .with_format(format)
        .with_quiet(format == OutputFormat::Json);

    match cli.command {
        Commands::Home => print_page(&mut session, Page::Home, None).await?,

        Commands::View { rows } => {
            if let Some(rows) = rows {
                session.set_preview_rows(rows);
            }
            print_page(&mut session, Page::ViewDataset, None).await?;
        }

        Commands::Analyze { filters } => {
            print_page(&mut session, Page::AnalyzeData, Some(&filters)).await?
        }

        Commands::Visualize { filters } => {
            print_page(&mut session, Page::Visualization, Some(&filters)).await?
        }

        Commands::Conclusion => print_page(&mut session, Page::Conclusion, None).await?,

        Commands::Page { name, filters } => match name.parse::<Page>() {
            Ok(page) => print_page(&mut session, page, Some(&filters)).await?,
            Err(_) => println!("{}", session.render(&PageReport::unavailable(&name))?),
        },

        Commands::Export {
            output,
            compression,
            filters,
        } => {
            let output = output.unwrap_or_else(generate_default_parquet_filename);
            export(&mut session, &filters, &output, &compression).await?;
        }

        Commands::Interactive => {
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            session.run(stdin, &mut stdout).await?;
        }
    }

    Ok(())
}

/// WARN by default, DEBUG with `--verbose`. Logs go to stderr, or to
/// `log_file` without ANSI colours.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| ReportError::Config(format!("Failed to initialise logging: {}", e)))
}

async fn print_page(
    session: &mut ReportSession,
    page: Page,
    filters: Option<&FilterArgs>,
) -> Result<()> {
    if page.uses_filters() {
        if let Some(filters) = filters.filter(|f| !f.is_empty()) {
            session.refresh().await;
            let base = session.view().and_then(|v| v.default_criteria());
            session.set_criteria(base.map(|b| filters.apply(b)));
        }
    }

    println!("{}", session.show(page).await?);
    Ok(())
}

async fn export(
    session: &mut ReportSession,
    filters: &FilterArgs,
    output: &Path,
    compression: &str,
) -> Result<PathBuf> {
    let writer = ParquetWriter::new().with_compression(compression)?;
    session.fetch().await?;
    session.refresh().await;
    let view = session
        .view()
        .ok_or_else(|| ReportError::Config("dataset not loaded".to_string()))?;

    let filtered = match view.default_criteria() {
        Some(base) => view.filter(&filters.apply(base)),
        None => view.dataset().clone(),
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    println!(
        "Writing {} records to {}...",
        filtered.len(),
        output.display()
    );
    writer.write_dataset(&filtered, output)?;
    info!(rows = filtered.len(), path = %output.display(), "export complete");

    let file_info = writer.get_file_info(output)?;
    println!("\n{}", file_info.summary());
    println!("Export complete!");

    Ok(output.to_path_buf())
}
