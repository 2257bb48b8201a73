use crate::processors::{FiveNumberSummary, HistogramBin, ScatterSeries};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Histogram,
    Bar,
    Scatter,
    Line,
    Box,
}

/// A chart ready for a plotting front end: layout plus computed data.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub id: &'static str,
    pub kind: ChartKind,
    pub title: String,
    pub x_field: String,
    pub y_fields: Vec<String>,
    pub grouping: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxGroup {
    pub label: String,
    pub summary: Option<FiveNumberSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    Bars {
        categories: Vec<String>,
        values: Vec<Option<f64>>,
    },
    Histogram {
        bins: Vec<HistogramBin>,
    },
    Scatter {
        series: Vec<ScatterSeries>,
    },
    Lines {
        x: Vec<u32>,
        series: Vec<LineSeries>,
    },
    Boxes {
        groups: Vec<BoxGroup>,
    },
}

impl ChartData {
    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Bars { values, .. } => values.iter().all(Option::is_none),
            ChartData::Histogram { bins } => bins.is_empty(),
            ChartData::Scatter { series } => series.iter().all(|s| s.points.is_empty()),
            ChartData::Lines { x, .. } => x.is_empty(),
            ChartData::Boxes { groups } => groups.iter().all(|g| g.summary.is_none()),
        }
    }
}
