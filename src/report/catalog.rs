//! Which charts each page shows. Pages differ only by this table; the
//! builder turns each entry into a [`ChartSpec`](super::ChartSpec).

use crate::models::Column;
use crate::report::chart::ChartKind;
use crate::report::narrative::Topic;
use crate::report::page::Page;

#[derive(Debug, Clone, Copy)]
pub enum ChartSource {
    /// Mean of each column over the filtered view.
    ColumnMeans(&'static [Column]),
    Histogram(Column),
    /// One series per y column against a shared x column.
    Scatter { x: Column, y: &'static [Column] },
    /// Per-month mean of each column.
    MonthlyMeans(&'static [Column]),
    /// Distribution of a column within each rain bucket.
    RainBoxPlot(Column),
}

impl ChartSource {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartSource::ColumnMeans(_) => ChartKind::Bar,
            ChartSource::Histogram(_) => ChartKind::Histogram,
            ChartSource::Scatter { .. } => ChartKind::Scatter,
            ChartSource::MonthlyMeans(_) => ChartKind::Line,
            ChartSource::RainBoxPlot(_) => ChartKind::Box,
        }
    }

    /// Columns the chart reads; a chart is skipped when any is absent.
    pub fn columns(&self) -> Vec<Column> {
        match self {
            ChartSource::ColumnMeans(cols) | ChartSource::MonthlyMeans(cols) => cols.to_vec(),
            ChartSource::Histogram(c) => vec![*c],
            ChartSource::Scatter { x, y } => std::iter::once(*x).chain(y.iter().copied()).collect(),
            ChartSource::RainBoxPlot(c) => vec![Column::Rain, *c],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChartTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub source: ChartSource,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub topic: Topic,
}

const TRAFFIC_POLLUTANTS: &[Column] = &[Column::No2, Column::Co, Column::Pm25];

pub const ANALYZE_CHARTS: &[ChartTemplate] = &[ChartTemplate {
    id: "pollutant_means",
    title: "Mean NO2, CO and PM2.5 Concentration",
    source: ChartSource::ColumnMeans(TRAFFIC_POLLUTANTS),
    x_label: "Pollutant",
    y_label: "Concentration (µg/m³)",
    topic: Topic::PollutantMeans,
}];

pub const VISUALIZATION_CHARTS: &[ChartTemplate] = &[
    ChartTemplate {
        id: "pm25_distribution",
        title: "Distribution of PM2.5",
        source: ChartSource::Histogram(Column::Pm25),
        x_label: "PM2.5 (µg/m³)",
        y_label: "Hours",
        topic: Topic::Pm25Distribution,
    },
    ChartTemplate {
        id: "wind_vs_pm25",
        title: "Wind Speed vs PM2.5",
        source: ChartSource::Scatter {
            x: Column::Wspm,
            y: &[Column::Pm25],
        },
        x_label: "Wind speed (m/s)",
        y_label: "PM2.5 (µg/m³)",
        topic: Topic::WindDispersion,
    },
    ChartTemplate {
        id: "monthly_no2_co",
        title: "Monthly Mean NO2 and CO",
        source: ChartSource::MonthlyMeans(&[Column::No2, Column::Co]),
        x_label: "Month",
        y_label: "Concentration (µg/m³)",
        topic: Topic::MonthlyTraffic,
    },
    ChartTemplate {
        id: "rain_vs_pm25",
        title: "PM2.5 by Rain Intensity",
        source: ChartSource::RainBoxPlot(Column::Pm25),
        x_label: "Rain intensity",
        y_label: "PM2.5 (µg/m³)",
        topic: Topic::RainWashout,
    },
    ChartTemplate {
        id: "ozone_precursors",
        title: "NO2 and CO vs O3",
        source: ChartSource::Scatter {
            x: Column::O3,
            y: &[Column::No2, Column::Co],
        },
        x_label: "O3 (µg/m³)",
        y_label: "Concentration (µg/m³)",
        topic: Topic::OzoneFormation,
    },
];

pub fn charts_for(page: Page) -> &'static [ChartTemplate] {
    match page {
        Page::AnalyzeData => ANALYZE_CHARTS,
        Page::Visualization => VISUALIZATION_CHARTS,
        Page::Home | Page::ViewDataset | Page::Conclusion => &[],
    }
}
