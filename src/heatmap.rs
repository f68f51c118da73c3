//! Heat-map grid model and its shrink-to-fit layout.
//!
//! The grid is keyed by the distinct X labels (ascending) and the distinct
//! Y values (descending). The layout is computed once at natural size and
//! then scaled uniformly so it fits the measured container.

use crate::data::{Record, ResultSet, Scalar};
use crate::format::{capitalize_label, format_grouped, truncate_label};
use crate::geometry::GeometryContext;
use crate::ir::{
    ContainerSize, HeatCell, HeatmapChart, HeatmapRequest, Legend, LegendEntry, Placeholder,
    Tooltip, TooltipRow,
};
use crate::palette::{distinct_in_order, ChartFamily};
use crate::selection::AxisChoice;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Optional grouping attribute that drives cell colors when present
pub const CATEGORY_FIELD: &str = "category";
pub const EMPTY_CELL_COLOR: &str = "#f1f5f9";
const LEGEND_LABEL_MAX_LEN: usize = 15;
/// Gap between the Y title and tick columns, and between ticks and grid
const AXIS_GAPS: f64 = 5.0 + 8.0;
/// Gap between the X title area and the bottom edge
const BOTTOM_GAP: f64 = 10.0;
/// Space between the grid and the legend column
const LEGEND_GAP: f64 = 15.0;

fn default_min_cell_width() -> f64 { 30.0 }
fn default_max_cell_width() -> f64 { 150.0 }
fn default_cell_height() -> f64 { 35.0 }
fn default_y_tick_width() -> f64 { 65.0 }
fn default_y_title_width() -> f64 { 55.0 }
fn default_legend_width() -> f64 { 160.0 }
fn default_x_label_height() -> f64 { 60.0 }
fn default_x_title_height() -> f64 { 40.0 }
fn default_padding_right() -> f64 { 25.0 }
fn default_padding_top() -> f64 { 5.0 }
fn default_min_scale() -> f64 { 0.01 }
fn default_title_height() -> f64 { 50.0 }

/// Fixed chrome sizes, in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConstants {
    #[serde(default = "default_min_cell_width")]
    pub min_cell_width: f64,
    #[serde(default = "default_max_cell_width")]
    pub max_cell_width: f64,
    #[serde(default = "default_cell_height")]
    pub cell_height: f64,
    #[serde(default = "default_y_tick_width")]
    pub y_tick_width: f64,
    #[serde(default = "default_y_title_width")]
    pub y_title_width: f64,
    #[serde(default = "default_legend_width")]
    pub legend_width: f64,
    #[serde(default = "default_x_label_height")]
    pub x_label_height: f64,
    #[serde(default = "default_x_title_height")]
    pub x_title_height: f64,
    #[serde(default = "default_padding_right")]
    pub padding_right: f64,
    #[serde(default = "default_padding_top")]
    pub padding_top: f64,
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    /// Title height assumed until the host measures it
    #[serde(default = "default_title_height")]
    pub title_height: f64,
}

impl Default for HeatmapConstants {
    fn default() -> Self {
        Self {
            min_cell_width: default_min_cell_width(),
            max_cell_width: default_max_cell_width(),
            cell_height: default_cell_height(),
            y_tick_width: default_y_tick_width(),
            y_title_width: default_y_title_width(),
            legend_width: default_legend_width(),
            x_label_height: default_x_label_height(),
            x_title_height: default_x_title_height(),
            padding_right: default_padding_right(),
            padding_top: default_padding_top(),
            min_scale: default_min_scale(),
            title_height: default_title_height(),
        }
    }
}

impl HeatmapConstants {
    /// Everything left of the grid
    pub fn left_chrome(&self) -> f64 {
        self.y_tick_width + self.y_title_width + AXIS_GAPS
    }

    /// Everything below the grid
    pub fn bottom_chrome(&self) -> f64 {
        self.x_label_height + self.x_title_height + BOTTOM_GAP
    }
}

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Pixel offsets of each structural region at natural size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapRegions {
    pub y_title: Rect,
    pub y_ticks: Rect,
    pub grid: Rect,
    pub x_labels: Rect,
    pub x_title: Rect,
    pub legend: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapLayout {
    pub available_width: f64,
    pub available_height: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub grid_width: f64,
    pub grid_height: f64,
    pub natural_width: f64,
    pub natural_height: f64,
    /// Uniform shrink factor in `(0, 1]`
    pub scale: f64,
    pub scaled_width: f64,
    pub scaled_height: f64,
    /// Longest the rotated Y title may run
    pub y_title_max_length: f64,
    pub regions: HeatmapRegions,
}

/// Fit a grid of `x_count` by `y_count` cells into the container.
///
/// Pure: the same inputs always give the same layout, so resize
/// notifications can be dropped or coalesced freely.
pub fn compute_layout(
    container: ContainerSize,
    x_count: usize,
    y_count: usize,
    constants: &HeatmapConstants,
) -> Result<HeatmapLayout, Placeholder> {
    if x_count == 0 || y_count == 0 {
        return Err(Placeholder::NotEnoughData);
    }

    let title_height = container.title_height.unwrap_or(constants.title_height);
    let available_width = container.width;
    let available_height = container.height - title_height;
    if !(available_width > 0.0) || !(available_height > 0.0) {
        return Err(Placeholder::Initializing);
    }

    let left = constants.left_chrome();
    let bottom = constants.bottom_chrome();
    let available_grid_width =
        available_width - left - constants.legend_width - constants.padding_right;
    let cell_width = (available_grid_width / x_count as f64)
        .min(constants.max_cell_width)
        .max(constants.min_cell_width);
    let cell_height = constants.cell_height;

    let grid_width = x_count as f64 * cell_width;
    let grid_height = y_count as f64 * cell_height;
    let natural_width = left + grid_width + constants.legend_width + constants.padding_right;
    let natural_height = constants.padding_top + grid_height + bottom;

    let mut scale = 1.0_f64
        .min(available_width / natural_width)
        .min(available_height / natural_height);
    if scale <= constants.min_scale {
        scale = constants.min_scale;
    }

    let top = constants.padding_top;
    let regions = HeatmapRegions {
        y_title: Rect::new(0.0, top, constants.y_title_width, grid_height),
        y_ticks: Rect::new(constants.y_title_width + 5.0, top, constants.y_tick_width, grid_height),
        grid: Rect::new(left, top, grid_width, grid_height),
        x_labels: Rect::new(left, top + grid_height, grid_width, constants.x_label_height),
        x_title: Rect::new(
            left,
            top + grid_height + constants.x_label_height,
            grid_width,
            constants.x_title_height,
        ),
        legend: Rect::new(
            left + grid_width + LEGEND_GAP,
            top,
            constants.legend_width - LEGEND_GAP,
            natural_height - top,
        ),
    };

    tracing::debug!(
        available_width,
        available_height,
        natural_width,
        natural_height,
        scale,
        "Heatmap layout computed"
    );

    Ok(HeatmapLayout {
        available_width,
        available_height,
        cell_width,
        cell_height,
        grid_width,
        grid_height,
        natural_width,
        natural_height,
        scale,
        scaled_width: natural_width * scale,
        scaled_height: natural_height * scale,
        y_title_max_length: grid_height,
        regions,
    })
}

/// Receives container size notifications and recomputes the layout from
/// scratch for the most recent one.
#[derive(Debug, Clone)]
pub struct LayoutSubscription {
    x_count: usize,
    y_count: usize,
    constants: HeatmapConstants,
    pending: Option<ContainerSize>,
    /// Most recent notified size, kept across flushes
    last_size: Option<ContainerSize>,
    current: Option<Result<HeatmapLayout, Placeholder>>,
}

impl LayoutSubscription {
    pub fn new(x_count: usize, y_count: usize, constants: HeatmapConstants) -> Self {
        Self {
            x_count,
            y_count,
            constants,
            pending: None,
            last_size: None,
            current: None,
        }
    }

    /// Record a size; earlier unflushed sizes are superseded.
    pub fn notify(&mut self, size: ContainerSize) {
        self.pending = Some(size);
        self.last_size = Some(size);
    }

    /// New label counts invalidate the layout for the last known size,
    /// whatever the previous flush produced.
    pub fn set_labels(&mut self, x_count: usize, y_count: usize) {
        self.x_count = x_count;
        self.y_count = y_count;
        if self.pending.is_none() {
            self.pending = self.last_size;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Recompute for the latest pending size, if any.
    pub fn flush(&mut self) -> Option<&Result<HeatmapLayout, Placeholder>> {
        let size = self.pending.take()?;
        self.current = Some(compute_layout(size, self.x_count, self.y_count, &self.constants));
        self.current.as_ref()
    }

    /// Layout as of the last flush; `Initializing` before any size arrived.
    pub fn current(&self) -> Result<HeatmapLayout, Placeholder> {
        self.current.unwrap_or(Err(Placeholder::Initializing))
    }
}

// =============================================================================
// Grid model
// =============================================================================

/// Distinct axis labels and the sparse cell map of a heat map.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<f64>,
    /// `(y bits, x label) -> record index`, last record wins
    cells: HashMap<(u64, String), usize>,
    /// Records that passed validation, in input order
    valid: Vec<usize>,
}

impl HeatmapGrid {
    pub fn cell(&self, y: f64, x: &str) -> Option<usize> {
        self.cells.get(&(cell_key(y), x.to_string())).copied()
    }

    pub fn valid_records(&self) -> &[usize] {
        &self.valid
    }
}

fn cell_key(y: f64) -> u64 {
    // -0 and 0 share a row
    (y + 0.0).to_bits()
}

fn x_label_of(record: &Record, x: &AxisChoice, index: usize) -> Option<String> {
    match x {
        AxisChoice::All => Some(format!("Item {}", index + 1)),
        AxisChoice::Field(field) => record.get(field).map(Scalar::to_string),
    }
}

fn y_value_of(record: &Record, y_field: &str) -> Option<f64> {
    record
        .get(y_field)
        .and_then(Scalar::to_f64_strict)
        .filter(|v| v.is_finite())
}

/// Build the grid from records whose X is present and whose Y is a finite
/// number.
pub fn build_grid(data: &ResultSet, x: &AxisChoice, y_field: &str) -> Result<HeatmapGrid, Placeholder> {
    let mut x_labels = Vec::new();
    let mut y_labels = Vec::new();
    let mut cells = HashMap::new();
    let mut valid = Vec::new();

    for (index, record) in data.iter().enumerate() {
        let (Some(x_label), Some(y)) = (x_label_of(record, x, index), y_value_of(record, y_field)) else {
            tracing::trace!(record = index, "Skipping heatmap record");
            continue;
        };
        x_labels.push(x_label.clone());
        y_labels.push(y + 0.0);
        cells.insert((cell_key(y), x_label), index);
        valid.push(index);
    }

    if valid.is_empty() {
        return Err(Placeholder::NoValidPoints);
    }

    x_labels.sort();
    x_labels.dedup();
    y_labels.sort_by(|a, b| b.total_cmp(a));
    y_labels.dedup();

    Ok(HeatmapGrid {
        x_labels,
        y_labels,
        cells,
        valid,
    })
}

/// Full heat-map geometry: grid, colors, legend and layout.
pub fn heatmap_chart(
    request: &HeatmapRequest,
    data: &ResultSet,
    ctx: &GeometryContext,
    constants: &HeatmapConstants,
) -> Result<HeatmapChart, Placeholder> {
    if data.is_empty() {
        return Err(Placeholder::NoData);
    }
    let grid = build_grid(data, &request.x, &request.y)?;
    let layout = compute_layout(
        request.container,
        grid.x_labels.len(),
        grid.y_labels.len(),
        constants,
    )?;

    let records = data.records();
    let category_of = |index: usize| {
        records[index]
            .get(CATEGORY_FIELD)
            .filter(|c| c.is_truthy())
            .map(Scalar::to_string)
    };
    let x_of = |index: usize| x_label_of(&records[index], &request.x, index).unwrap_or_default();
    let color_key = |index: usize| category_of(index).unwrap_or_else(|| x_of(index));

    let palette = ctx.palettes.palette(ChartFamily::Heatmap);
    let assignment = palette.assign(grid.valid.iter().map(|&i| color_key(i)));

    let categories = distinct_in_order(grid.valid.iter().filter_map(|&i| category_of(i)));
    let x_title = match &request.x {
        AxisChoice::All => "Item".to_string(),
        AxisChoice::Field(field) => capitalize_label(field),
    };
    let y_title = capitalize_label(&request.y);

    let (legend_title, legend_names) = if categories.is_empty() {
        (x_title.clone(), grid.x_labels.clone())
    } else {
        ("Category".to_string(), categories)
    };
    let legend = Legend {
        title: legend_title,
        entries: legend_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| LegendEntry {
                label: truncate_label(&capitalize_label(&name), LEGEND_LABEL_MAX_LEN, ".."),
                color: assignment
                    .color_for(&name)
                    .unwrap_or_else(|| palette.color_at(i))
                    .to_string(),
                name,
            })
            .collect(),
    };

    let rows = grid
        .y_labels
        .iter()
        .map(|&y| {
            grid.x_labels
                .iter()
                .map(|x| match grid.cell(y, x) {
                    Some(index) => {
                        let mut rows = vec![TooltipRow {
                            label: y_title.clone(),
                            value: format_grouped(y, 0, 3),
                            color: None,
                        }];
                        if let Some(category) = category_of(index) {
                            rows.push(TooltipRow {
                                label: "Category".to_string(),
                                value: category,
                                color: None,
                            });
                        }
                        HeatCell {
                            x_label: x.clone(),
                            y_value: y,
                            source: Some(index),
                            color: assignment
                                .color_for(&color_key(index))
                                .unwrap_or(EMPTY_CELL_COLOR)
                                .to_string(),
                            text: ctx.formatter.compact(y),
                            tooltip: Some(Tooltip {
                                title: format!("{}: {}", x_title, x),
                                rows,
                            }),
                        }
                    }
                    None => HeatCell {
                        x_label: x.clone(),
                        y_value: y,
                        source: None,
                        color: EMPTY_CELL_COLOR.to_string(),
                        text: "-".to_string(),
                        tooltip: None,
                    },
                })
                .collect()
        })
        .collect();

    let y_tick_labels = grid.y_labels.iter().map(|&y| ctx.formatter.compact(y)).collect();

    Ok(HeatmapChart {
        title: format!("{} by {} Heatmap", y_title, x_title),
        y_axis_title: ctx.y_axis_title(&y_title),
        x_axis_title: x_title,
        x_labels: grid.x_labels,
        y_labels: grid.y_labels,
        y_tick_labels,
        rows,
        legend,
        layout,
    })
}

/// Tooltip of a cell as plain text, `"No data"` for empty cells.
pub fn cell_tooltip_text(cell: &HeatCell) -> String {
    match &cell.tooltip {
        Some(tooltip) => std::iter::once(tooltip.title.clone())
            .chain(tooltip.rows.iter().map(|r| format!("{}: {}", r.label, r.value)))
            .collect::<Vec<_>>()
            .join("\n"),
        None => "No data".to_string(),
    }
}
