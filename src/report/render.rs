use crate::error::Result;
use crate::report::builder::{Block, PageReport, Preview};
use crate::report::chart::{ChartData, ChartSpec};
use crate::utils::constants::ASCII_BAR_WIDTH;
use std::fmt::{self, Write};

/// Turns a built page into output for the terminal or another tool.
pub trait Renderer {
    fn render(&self, report: &PageReport) -> Result<String>;
}

/// Plain-text output with ASCII bar charts.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    bar_width: usize,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            bar_width: ASCII_BAR_WIDTH,
        }
    }

    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width.max(1);
        self
    }

    fn bar(&self, value: f64, max: f64) -> String {
        if max <= 0.0 || value <= 0.0 {
            return String::new();
        }
        let len = ((value / max) * self.bar_width as f64).round() as usize;
        "█".repeat(len.max(1))
    }

    fn render_chart(&self, out: &mut String, chart: &ChartSpec) -> fmt::Result {
        writeln!(out, "\n{}", chart.title)?;
        writeln!(out, "{}", "-".repeat(chart.title.chars().count()))?;
        writeln!(out, "x: {}  y: {}", chart.x_label, chart.y_label)?;

        if chart.data.is_empty() {
            return writeln!(out, "(no values to plot)");
        }

        match &chart.data {
            ChartData::Bars { categories, values } => {
                let max = values.iter().flatten().copied().fold(0.0, f64::max);
                let width = label_width(categories.iter().map(String::as_str));
                for (label, value) in categories.iter().zip(values) {
                    match value {
                        Some(v) => {
                            writeln!(out, "{:>width$} | {} {:.2}", label, self.bar(*v, max), v)?
                        }
                        None => writeln!(out, "{:>width$} | n/a", label)?,
                    }
                }
            }
            ChartData::Histogram { bins } => {
                let max = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
                for bin in bins {
                    writeln!(
                        out,
                        "{:>9.1} - {:<9.1} | {} {}",
                        bin.lower,
                        bin.upper,
                        self.bar(bin.count as f64, max),
                        bin.count
                    )?;
                }
            }
            ChartData::Scatter { series } => {
                for s in series {
                    let r = s
                        .correlation
                        .map_or_else(|| "n/a".to_string(), |r| format!("{:.3}", r));
                    writeln!(
                        out,
                        "{} vs {}: {} points, r = {}",
                        s.y.header(),
                        s.x.header(),
                        s.points.len(),
                        r
                    )?;
                }
            }
            ChartData::Lines { x, series } => {
                write!(out, "{:>5}", "month")?;
                for s in series {
                    write!(out, " {:>10}", s.name)?;
                }
                writeln!(out)?;
                for (i, month) in x.iter().enumerate() {
                    write!(out, "{:>5}", month)?;
                    for s in series {
                        match s.values.get(i).copied().flatten() {
                            Some(v) => write!(out, " {:>10.2}", v)?,
                            None => write!(out, " {:>10}", "n/a")?,
                        }
                    }
                    writeln!(out)?;
                }
            }
            ChartData::Boxes { groups } => {
                let width = label_width(groups.iter().map(|g| g.label.as_str()));
                for group in groups {
                    match &group.summary {
                        Some(s) => writeln!(
                            out,
                            "{:>width$} | min {:.1}  q1 {:.1}  median {:.1}  q3 {:.1}  \
                             max {:.1}  (n={})",
                            group.label, s.min, s.q1, s.median, s.q3, s.max, s.count
                        )?,
                        None => writeln!(out, "{:>width$} | no hours", group.label)?,
                    }
                }
            }
        }
        Ok(())
    }

    fn render_page(&self, out: &mut String, report: &PageReport) -> fmt::Result {
        writeln!(out, "{}", report.title)?;
        writeln!(out, "{}", "=".repeat(report.title.chars().count()))?;

        for block in &report.blocks {
            match block {
                Block::Text { text } => writeln!(out, "{}", text)?,
                Block::List { items } => {
                    for (i, item) in items.iter().enumerate() {
                        writeln!(out, "{}. {}", i + 1, item)?;
                    }
                }
                Block::Filter {
                    criteria,
                    weather_available,
                } => {
                    writeln!(out, "Filter: {}", criteria.describe())?;
                    if !weather_available {
                        writeln!(out, "Weather filter: not available for this dataset")?;
                    }
                }
                Block::Preview { title, preview } => {
                    writeln!(out, "\n{}:", title)?;
                    render_table(out, preview)?;
                }
                Block::Summary { summary } => writeln!(out, "\n{}", summary.detailed_summary())?,
                Block::Chart { chart, narrative } => {
                    self.render_chart(out, chart)?;
                    writeln!(out, "{}", narrative)?;
                }
                Block::Notice { notice } => writeln!(out, "⚠️  {}", notice.message())?,
            }
        }
        Ok(())
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|l| l.chars().count()).max().unwrap_or(0)
}

fn render_table(out: &mut String, preview: &Preview) -> fmt::Result {
    let mut widths: Vec<usize> = preview.columns.iter().map(|c| c.len()).collect();
    for row in &preview.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:>w$}", c, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(out, "{}", line(&preview.columns[..]))?;
    for row in &preview.rows {
        writeln!(out, "{}", line(row.as_slice()))?;
    }
    writeln!(
        out,
        "({} of {} rows)",
        preview.rows.len(),
        preview.total_rows
    )
}

impl Renderer for TextRenderer {
    fn render(&self, report: &PageReport) -> Result<String> {
        let mut out = String::new();
        self.render_page(&mut out, report)?;
        Ok(out)
    }
}

/// Pretty-printed JSON of the whole page, chart data included.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, report: &PageReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
