use crate::heatmap::HeatmapLayout;
use crate::scale::AxisTick;
use crate::selection::AxisChoice;
use crate::table::TableView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Table,
    Bar,
    Line,
    Pie,
    ScatterPlot,
    HeatMap,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Table => "table",
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::ScatterPlot => "scatterPlot",
            ChartKind::HeatMap => "heatMap",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(ChartKind::Table),
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "pie" => Ok(ChartKind::Pie),
            "scatter" | "scatterplot" => Ok(ChartKind::ScatterPlot),
            "heatmap" => Ok(ChartKind::HeatMap),
            other => Err(format!(
                "unknown chart kind '{}' (expected table, bar, line, pie, scatterPlot or heatMap)",
                other
            )),
        }
    }
}

/// The value side of a bar or line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Measure {
    Field(String),
    /// One series per numeric field.
    AllNumeric(Vec<String>),
}

/// Measured content box of the element hosting a heat map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
    /// Height taken by the rendered title; the configured default when unknown.
    #[serde(default)]
    pub title_height: Option<f64>,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, title_height: None }
    }

    pub fn with_title_height(mut self, title_height: f64) -> Self {
        self.title_height = Some(title_height);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRequest {
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartesianRequest {
    pub x: AxisChoice,
    pub y: Measure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieRequest {
    pub x: AxisChoice,
    pub y: String,
}

/// `y == AxisChoice::All` resolves to the first numeric field of the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterRequest {
    pub x: AxisChoice,
    pub y: AxisChoice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRequest {
    pub x: AxisChoice,
    pub y: String,
    pub container: ContainerSize,
}

/// One chart to compute, carrying exactly what that chart needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartRequest {
    Table(TableRequest),
    Bar(CartesianRequest),
    Line(CartesianRequest),
    Pie(PieRequest),
    Scatter(ScatterRequest),
    HeatMap(HeatmapRequest),
}

impl ChartRequest {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartRequest::Table(_) => ChartKind::Table,
            ChartRequest::Bar(_) => ChartKind::Bar,
            ChartRequest::Line(_) => ChartKind::Line,
            ChartRequest::Pie(_) => ChartKind::Pie,
            ChartRequest::Scatter(_) => ChartKind::ScatterPlot,
            ChartRequest::HeatMap(_) => ChartKind::HeatMap,
        }
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// Named empty/error states a presentation layer shows instead of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placeholder {
    NoData,
    SelectAxes,
    NoValidPoints,
    Initializing,
    NotEnoughData,
}

impl Placeholder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placeholder::NoData => "no-data",
            Placeholder::SelectAxes => "select-axes",
            Placeholder::NoValidPoints => "no-valid-points",
            Placeholder::Initializing => "initializing",
            Placeholder::NotEnoughData => "not-enough-data",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Placeholder::NoData => "No data available to display.",
            Placeholder::SelectAxes => "Please select both X and Y axes to display the chart.",
            Placeholder::NoValidPoints => "No valid data points to plot for the selected fields.",
            Placeholder::Initializing => "Initializing chart...",
            Placeholder::NotEnoughData => "Not enough data for X or Y axes to display the chart.",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    /// Raw label the color is keyed by
    pub name: String,
    /// Display text
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipRow {
    pub label: String,
    pub value: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub title: String,
    pub rows: Vec<TooltipRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Category label on the X axis
    pub x: String,
    pub y: f64,
    /// `y` through the chart's formatter
    pub label: String,
    pub color: String,
    /// Index of the record this point came from
    pub source: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Field the values are read from
    pub name: String,
    pub label: String,
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

/// Bar and line charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartesianChart {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    /// One entry per record, in record order
    pub categories: Vec<String>,
    pub category_labels: Vec<String>,
    pub series: Vec<Series>,
    pub legend: Legend,
    pub y_ticks: Vec<AxisTick>,
}

impl CartesianChart {
    /// Hover content for the category at `index`: one row per series that
    /// has a value there.
    pub fn tooltip(&self, index: usize) -> Option<Tooltip> {
        let label = self.category_labels.get(index)?;
        let rows: Vec<TooltipRow> = self
            .series
            .iter()
            .filter_map(|series| {
                series
                    .points
                    .iter()
                    .find(|p| p.source == index)
                    .map(|p| TooltipRow {
                        label: series.label.clone(),
                        value: p.label.clone(),
                        color: Some(p.color.clone()),
                    })
            })
            .collect();
        if rows.is_empty() {
            return None;
        }
        Some(Tooltip {
            title: format!("{}: {}", self.x_axis_title, label),
            rows,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub label: String,
    pub value: f64,
    /// Share of the total in `0..=1`
    pub percent: f64,
    pub color: String,
    pub source: usize,
    /// Label drawn outside the slice; `None` when the slice is too thin
    pub outer_label: Option<String>,
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub value_label: String,
    pub total: f64,
    pub slices: Vec<PieSlice>,
    pub legend: Legend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub category: String,
    /// Position of `category` in the sorted distinct labels
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub source: usize,
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterChart {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub categories: Vec<String>,
    pub points: Vec<ScatterPoint>,
    pub legend: Legend,
    pub x_ticks: Vec<AxisTick>,
    pub y_ticks: Vec<AxisTick>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCell {
    pub x_label: String,
    pub y_value: f64,
    /// Record occupying the cell, last one wins on collisions
    pub source: Option<usize>,
    pub color: String,
    /// Text drawn inside the cell
    pub text: String,
    pub tooltip: Option<Tooltip>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapChart {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    /// Distinct X labels, ascending
    pub x_labels: Vec<String>,
    /// Distinct Y values, descending
    pub y_labels: Vec<f64>,
    pub y_tick_labels: Vec<String>,
    /// `rows[i][j]` is the cell at `y_labels[i]`, `x_labels[j]`
    pub rows: Vec<Vec<HeatCell>>,
    pub legend: Legend,
    pub layout: HeatmapLayout,
}

/// What a presentation layer paints for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "chart", rename_all = "camelCase")]
pub enum ChartOutput {
    Table(TableView),
    Bar(CartesianChart),
    Line(CartesianChart),
    Pie(PieChart),
    Scatter(ScatterChart),
    HeatMap(HeatmapChart),
    Placeholder(Placeholder),
    /// The chart failed; siblings are unaffected.
    Failed { message: String },
}

impl ChartOutput {
    pub fn placeholder(&self) -> Option<Placeholder> {
        match self {
            ChartOutput::Placeholder(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ChartOutput::Failed { .. })
    }
}

impl From<Placeholder> for ChartOutput {
    fn from(value: Placeholder) -> Self {
        ChartOutput::Placeholder(value)
    }
}
