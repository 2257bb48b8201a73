use crate::analyzers::{DatasetAnalyzer, DatasetSummary};
use crate::models::{AirQualityRecord, Column, Dataset, FilterCriteria, WeatherCategory};
use crate::processors::{DatasetView, FiveNumberSummary};
use crate::report::catalog::{charts_for, ChartSource, ChartTemplate};
use crate::report::chart::{BoxGroup, ChartData, ChartSpec, LineSeries};
use crate::report::narrative::{describe_correlation, CONCLUSIONS};
use crate::report::page::Page;
use crate::settings::HomeSettings;
use serde::Serialize;
use tracing::debug;

/// Conditions shown in place of (or next to) data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The filter combination matched no rows.
    EmptyResult,
    DataUnavailable { reason: String },
    WeatherFilterUnavailable,
    ChartSkipped { chart: String, missing: Vec<String> },
    PageUnavailable { name: String },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::EmptyResult => "No data for the selected filters.".to_string(),
            Notice::DataUnavailable { reason } => format!(
                "Data could not be loaded ({}). \
                 Make sure the dataset file is in the expected location.",
                reason
            ),
            Notice::WeatherFilterUnavailable => {
                "Weather filter ignored: the dataset has no weathersit column.".to_string()
            }
            Notice::ChartSkipped { chart, missing } => format!(
                "Chart '{}' skipped: missing column(s) {}.",
                chart,
                missing.join(", ")
            ),
            Notice::PageUnavailable { name } => format!("Menu '{}' is not available yet.", name),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

#[derive(Debug, Serialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum Block {
    Text { text: String },
    List { items: Vec<String> },
    Filter {
        criteria: FilterCriteria,
        weather_available: bool,
    },
    Preview { title: String, preview: Preview },
    Summary { summary: DatasetSummary },
    Chart { chart: ChartSpec, narrative: String },
    Notice { notice: Notice },
}

#[derive(Debug, Serialize)]
pub struct PageReport {
    pub page: Option<Page>,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl PageReport {
    fn new(page: Page, title: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Report for a menu selection that matches no page.
    pub fn unavailable(name: &str) -> Self {
        Self {
            page: None,
            title: name.to_string(),
            blocks: vec![Block::Notice {
                notice: Notice::PageUnavailable {
                    name: name.to_string(),
                },
            }],
        }
    }

    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    fn notice(&mut self, notice: Notice) {
        self.blocks.push(Block::Notice { notice });
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Notice { notice } => Some(notice),
            _ => None,
        })
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Chart { chart, .. } => Some(chart),
            _ => None,
        })
    }
}

/// Dataset state handed to the builder.
pub enum DataSource<'a> {
    Loaded(&'a DatasetView),
    Unavailable(String),
}

/// Builds one page of the report from the current dataset and filter.
pub struct ReportBuilder<'a> {
    home: &'a HomeSettings,
    preview_rows: usize,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(home: &'a HomeSettings, preview_rows: usize) -> Self {
        Self { home, preview_rows }
    }

    /// `criteria` of `None` means the whole dataset with no season or
    /// weather restriction.
    pub fn build(
        &self,
        page: Page,
        data: &DataSource<'_>,
        criteria: Option<&FilterCriteria>,
    ) -> PageReport {
        let mut report = PageReport::new(page, page.title());

        match page {
            Page::Home => self.home_page(&mut report),
            Page::Conclusion => {
                report.title = "Conclusion".to_string();
                report.push(Block::Text {
                    text: "Findings from the data analysis:".to_string(),
                });
                report.push(Block::List {
                    items: CONCLUSIONS.iter().map(|s| s.to_string()).collect(),
                });
            }
            _ => match data {
                DataSource::Unavailable(reason) => report.notice(Notice::DataUnavailable {
                    reason: reason.clone(),
                }),
                DataSource::Loaded(view) => match page {
                    Page::ViewDataset => self.dataset_page(&mut report, view),
                    _ => self.filtered_page(&mut report, page, view, criteria),
                },
            },
        }

        report
    }

    fn home_page(&self, report: &mut PageReport) {
        report.title = self.home.title.clone();
        report.push(Block::Text {
            text: self.home.subtitle.clone(),
        });

        let mut credits = Vec::new();
        if let Some(author) = &self.home.author {
            credits.push(format!("Author: {}", author));
        }
        if let Some(email) = &self.home.email {
            credits.push(format!("Email: {}", email));
        }
        if !credits.is_empty() {
            report.push(Block::List { items: credits });
        }

        report.push(Block::List {
            items: Page::OPTIONS.iter().map(|p| p.title().to_string()).collect(),
        });
    }

    fn dataset_page(&self, report: &mut PageReport, view: &DatasetView) {
        let dataset = view.dataset();
        report.title = "Dataset Preview".to_string();
        report.push(Block::Preview {
            title: "Main dataset".to_string(),
            preview: preview(dataset, self.preview_rows),
        });
        report.push(Block::Summary {
            summary: DatasetAnalyzer::new().analyze(dataset),
        });
    }

    fn filtered_page(
        &self,
        report: &mut PageReport,
        page: Page,
        view: &DatasetView,
        criteria: Option<&FilterCriteria>,
    ) {
        let Some(criteria) = criteria.copied().or_else(|| view.default_criteria()) else {
            report.notice(Notice::EmptyResult);
            return;
        };

        let weather_available = view.weather_filter_available();
        report.push(Block::Filter {
            criteria,
            weather_available,
        });
        if !weather_available && criteria.weather != WeatherCategory::All {
            report.notice(Notice::WeatherFilterUnavailable);
        }

        let filtered = view.filter(&criteria);
        debug!(page = %page, rows = filtered.len(), "building page");

        if page == Page::AnalyzeData {
            report.push(Block::Preview {
                title: "Filtered data".to_string(),
                preview: preview(&filtered, self.preview_rows),
            });
        }

        if filtered.is_empty() {
            report.notice(Notice::EmptyResult);
            return;
        }

        for template in charts_for(page) {
            let missing: Vec<String> = template
                .source
                .columns()
                .into_iter()
                .filter(|c| !filtered.has_column(*c))
                .map(|c| c.header().to_string())
                .collect();
            if !missing.is_empty() {
                report.notice(Notice::ChartSkipped {
                    chart: template.title.to_string(),
                    missing,
                });
                continue;
            }

            let (chart, facts) = build_chart(template, view, &filtered);
            let narrative = template.topic.compose(&criteria, facts);
            report.push(Block::Chart { chart, narrative });
        }
    }
}

type FieldsAndData = (String, Vec<String>, Option<String>, ChartData, Option<String>);

fn build_chart(
    template: &ChartTemplate,
    view: &DatasetView,
    dataset: &Dataset,
) -> (ChartSpec, Option<String>) {
    let headers = |cols: &[Column]| -> Vec<String> {
        cols.iter().map(|c| c.header().to_string()).collect()
    };

    let (x_field, y_fields, grouping, data, facts): FieldsAndData = match template.source {
        ChartSource::ColumnMeans(columns) => {
            let means = view.column_means(dataset, columns);
            let facts = means
                .iter()
                .filter_map(|(c, m)| m.map(|m| format!("{} {:.1}", c.header(), m)))
                .collect::<Vec<_>>();
            (
                "pollutant".to_string(),
                headers(columns),
                None,
                ChartData::Bars {
                    categories: headers(columns),
                    values: means.into_iter().map(|(_, m)| m).collect(),
                },
                (!facts.is_empty()).then(|| format!("Means: {}.", facts.join(", "))),
            )
        }
        ChartSource::Histogram(column) => {
            let bins = view.histogram(dataset, column);
            let values: Vec<f64> = dataset.values(column).collect();
            let facts = FiveNumberSummary::from_values(&values).map(|s| {
                format!(
                    "Median {:.1}, interquartile range {:.1} to {:.1}.",
                    s.median, s.q1, s.q3
                )
            });
            (
                column.header().to_string(),
                vec!["count".to_string()],
                None,
                ChartData::Histogram { bins },
                facts,
            )
        }
        ChartSource::Scatter { x, y } => {
            let series: Vec<_> = y.iter().map(|c| view.scatter(dataset, x, *c)).collect();
            let facts = series
                .iter()
                .filter_map(|s| {
                    s.correlation.map(|r| {
                        format!(
                            "{} vs {}: {}.",
                            s.y.header(),
                            s.x.header(),
                            describe_correlation(r)
                        )
                    })
                })
                .collect::<Vec<_>>();
            (
                x.header().to_string(),
                headers(y),
                None,
                ChartData::Scatter { series },
                (!facts.is_empty()).then(|| facts.join(" ")),
            )
        }
        ChartSource::MonthlyMeans(columns) => {
            let monthly = view.aggregate_by_month(dataset, columns);
            let months: Vec<u32> = monthly.keys().copied().collect();
            let series = columns
                .iter()
                .map(|c| LineSeries {
                    name: c.header().to_string(),
                    values: monthly.values().map(|m| m.get(c).copied()).collect(),
                })
                .collect();
            let peak = columns.first().and_then(|first| {
                monthly
                    .iter()
                    .filter_map(|(month, m)| m.get(first).map(|v| (*month, *v)))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(month, v)| {
                    format!("{} peaks in month {} ({:.1}).", first.header(), month, v)
                })
            });
            (
                "month".to_string(),
                headers(columns),
                Some("month".to_string()),
                ChartData::Lines { x: months, series },
                peak,
            )
        }
        ChartSource::RainBoxPlot(column) => {
            let buckets = view.bucket_by_rain(dataset, column);
            let groups: Vec<BoxGroup> = buckets
                .iter()
                .map(|b| BoxGroup {
                    label: b.label.clone(),
                    summary: b.summary(),
                })
                .collect();
            let medians = groups
                .iter()
                .filter_map(|g| g.summary.map(|s| format!("{} {:.1}", g.label, s.median)))
                .collect::<Vec<_>>();
            (
                "rain_category".to_string(),
                vec![column.header().to_string()],
                Some("rain_category".to_string()),
                ChartData::Boxes { groups },
                (!medians.is_empty()).then(|| {
                format!(
                    "Median {} by bucket: {}.",
                    column.header(),
                    medians.join(", ")
                )
            }),
            )
        }
    };

    let chart = ChartSpec {
        id: template.id,
        kind: template.source.kind(),
        title: template.title.to_string(),
        x_field,
        y_fields,
        grouping,
        x_label: template.x_label.to_string(),
        y_label: template.y_label.to_string(),
        data,
    };
    (chart, facts)
}

fn format_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| format!("{}", v))
}

/// First `n` rows rendered as strings, with only the columns the dataset has.
pub fn preview(dataset: &Dataset, n: usize) -> Preview {
    let columns: Vec<Column> = dataset.columns().iter().copied().collect();
    let mut names = vec!["date_time".to_string()];
    names.extend(columns.iter().map(|c| c.header().to_string()));
    if dataset.has_weather_column() {
        names.push("weathersit".to_string());
    }

    let rows = dataset
        .head(n)
        .iter()
        .map(|r: &AirQualityRecord| {
            let mut row = vec![r.date_time.format("%Y-%m-%d %H:%M:%S").to_string()];
            row.extend(columns.iter().map(|c| format_cell(r.value(*c))));
            if dataset.has_weather_column() {
                row.push(r.weathersit.map_or_else(|| "NaN".to_string(), |w| w.to_string()));
            }
            row
        })
        .collect();

    Preview {
        columns: names,
        rows,
        total_rows: dataset.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Season, WeatherCategory};
    use crate::processors::DatasetView;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn view(with_weather: bool) -> DatasetView {
        let records = (1..=12)
            .map(|month| {
                let ts = NaiveDate::from_ymd_opt(2016, month, 10)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap();
                AirQualityRecord::builder(ts)
                    .value(Column::Pm25, 10.0 * month as f64)
                    .value(Column::No2, 40.0 + month as f64)
                    .value(Column::Co, 800.0 - month as f64)
                    .value(Column::O3, 5.0 * month as f64)
                    .value(Column::Wspm, 13.0 - month as f64)
                    .value(Column::Rain, (month % 5) as f64 * 2.0)
                    .weathersit((month % 3 + 1) as u8)
                    .build()
            })
            .collect();
        let columns: BTreeSet<Column> = Column::ALL.into_iter().collect();
        DatasetView::new(Arc::new(Dataset::new(records, columns, with_weather)))
    }

    fn builder_home() -> HomeSettings {
        HomeSettings {
            author: Some("Data Team".to_string()),
            ..HomeSettings::default()
        }
    }

    #[test]
    fn test_visualization_page_has_all_charts() {
        let home = builder_home();
        let view = view(true);
        let report = ReportBuilder::new(&home, 5).build(
            Page::Visualization,
            &DataSource::Loaded(&view),
            None,
        );

        let ids: Vec<&str> = report.charts().map(|c| c.id).collect();
        assert_eq!(
            ids,
            vec![
                "pm25_distribution",
                "wind_vs_pm25",
                "monthly_no2_co",
                "rain_vs_pm25",
                "ozone_precursors"
            ]
        );
        assert_eq!(report.notices().count(), 0);
    }

    #[test]
    fn test_analyze_page_bar_means() {
        let home = builder_home();
        let view = view(true);
        let criteria = view
            .default_criteria()
            .unwrap()
            .with_season(Season::Summer);
        let report = ReportBuilder::new(&home, 5).build(
            Page::AnalyzeData,
            &DataSource::Loaded(&view),
            Some(&criteria),
        );

        let chart = report.charts().next().unwrap();
        match &chart.data {
            ChartData::Bars { categories, values } => {
                assert_eq!(categories, &vec!["NO2", "CO", "PM2.5"]);
                // June-August: NO2 46..48, CO 794..792, PM2.5 60..80
                assert_eq!(values, &vec![Some(47.0), Some(793.0), Some(70.0)]);
            }
            other => panic!("unexpected chart data: {:?}", other),
        }
    }

    #[test]
    fn test_empty_filter_result_is_notice() {
        let home = builder_home();
        let view = view(true);
        let criteria = view
            .default_criteria()
            .unwrap()
            .with_start_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let report = ReportBuilder::new(&home, 5).build(
            Page::Visualization,
            &DataSource::Loaded(&view),
            Some(&criteria),
        );

        assert_eq!(report.charts().count(), 0);
        assert!(report.notices().any(|n| *n == Notice::EmptyResult));
    }

    #[test]
    fn test_weather_filter_without_column_notice() {
        let home = builder_home();
        let view = view(false);
        let criteria = view
            .default_criteria()
            .unwrap()
            .with_weather(WeatherCategory::Rainy);
        let report = ReportBuilder::new(&home, 5).build(
            Page::AnalyzeData,
            &DataSource::Loaded(&view),
            Some(&criteria),
        );

        assert!(report
            .notices()
            .any(|n| *n == Notice::WeatherFilterUnavailable));
        let preview_rows = report.blocks.iter().find_map(|b| match b {
            Block::Preview { preview, .. } => Some(preview.total_rows),
            _ => None,
        });
        assert_eq!(preview_rows, Some(12));
    }

    #[test]
    fn test_unavailable_data_keeps_home_working() {
        let home = builder_home();
        let builder = ReportBuilder::new(&home, 5);
        let missing = DataSource::Unavailable("file not found".to_string());

        let view_page = builder.build(Page::ViewDataset, &missing, None);
        assert!(matches!(
            view_page.notices().next(),
            Some(Notice::DataUnavailable { .. })
        ));

        let home_page = builder.build(Page::Home, &missing, None);
        assert_eq!(home_page.title, "Air Quality Analysis Dashboard");
        assert_eq!(home_page.notices().count(), 0);

        let conclusion = builder.build(Page::Conclusion, &missing, None);
        assert!(conclusion
            .blocks
            .iter()
            .any(|b| matches!(b, Block::List { items } if items.len() == 4)));
    }

    #[test]
    fn test_preview_limits_rows() {
        let view = view(true);
        let preview = preview(view.dataset(), 3);
        assert_eq!(preview.rows.len(), 3);
        assert_eq!(preview.total_rows, 12);
        assert_eq!(preview.columns.first().map(String::as_str), Some("date_time"));
        assert_eq!(preview.columns.last().map(String::as_str), Some("weathersit"));
        assert_eq!(preview.rows[0][0], "2016-01-10 08:00:00");
    }

    #[test]
    fn test_rain_box_facts_name_the_plotted_column() {
        let view = view(true);
        let template = ChartTemplate {
            id: "rain_vs_no2",
            title: "NO2 by Rain Intensity",
            source: ChartSource::RainBoxPlot(Column::No2),
            x_label: "Rain intensity",
            y_label: "NO2 (µg/m³)",
            topic: crate::report::narrative::Topic::RainWashout,
        };

        let (chart, facts) = build_chart(&template, &view, view.dataset());
        assert_eq!(chart.y_fields, vec!["NO2".to_string()]);
        let facts = facts.unwrap();
        assert!(facts.starts_with("Median NO2 by bucket:"));
        assert!(!facts.contains("PM2.5"));
    }
}
