use crate::classify::first_numeric_field;
use crate::data::{Record, ResultSet, Scalar};
use crate::format::{
    capitalize_label, format_grouped, sentence_case_label, to_fixed, truncate_label, ValueFormatter,
};
use crate::ir::{
    CartesianChart, CartesianRequest, Legend, LegendEntry, Measure, PieChart, PieRequest,
    PieSlice, Placeholder, ScatterChart, ScatterPoint, ScatterRequest, Series, SeriesPoint,
    Tooltip, TooltipRow,
};
use crate::palette::{ChartFamily, PaletteProvider};
use crate::scale::{axis_ticks, AxisTick};
use crate::selection::AxisChoice;
use std::cmp::Ordering;

/// Bar legend lists at most this many categories
const BAR_LEGEND_LIMIT: usize = 10;
const SCATTER_LEGEND_MAX_LEN: usize = 12;
const SCATTER_TITLE_MAX_LEN: usize = 15;

/// Shared services every chart family formats and colors through.
#[derive(Clone, Copy)]
pub struct GeometryContext<'a> {
    pub formatter: ValueFormatter,
    pub palettes: &'a dyn PaletteProvider,
    /// Appended to value-axis titles
    pub y_axis_unit: &'a str,
}

impl<'a> GeometryContext<'a> {
    /// Value-axis title with the unit appended.
    pub fn y_axis_title(&self, name: &str) -> String {
        if self.y_axis_unit.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", name, self.y_axis_unit)
        }
    }
}

// =============================================================================
// Category helpers
// =============================================================================

/// Raw category of a record: the X field's text, or `"Item {i+1}"` when X is
/// the row position. A missing field reads as empty text.
fn raw_category(record: &Record, x: &AxisChoice, index: usize) -> String {
    match x {
        AxisChoice::All => format!("Item {}", index + 1),
        AxisChoice::Field(field) => record.get(field).map(Scalar::to_string).unwrap_or_default(),
    }
}

fn display_category(raw: &str, x: &AxisChoice) -> String {
    match x {
        AxisChoice::All => raw.to_string(),
        AxisChoice::Field(_) => sentence_case_label(raw),
    }
}

fn x_axis_title(x: &AxisChoice) -> String {
    match x {
        AxisChoice::All => "Item".to_string(),
        AxisChoice::Field(field) => capitalize_label(field),
    }
}

// =============================================================================
// Bar and line
// =============================================================================

#[derive(Clone, Copy, PartialEq)]
enum CartesianStyle {
    Bar,
    Line,
}

/// Bars: one per record, colored per record, or one group per metric in
/// multi-metric mode.
pub fn bar_chart(
    request: &CartesianRequest,
    data: &ResultSet,
    ctx: &GeometryContext,
) -> Result<CartesianChart, Placeholder> {
    cartesian_chart(request, data, ctx, CartesianStyle::Bar)
}

/// Lines: one per metric.
pub fn line_chart(
    request: &CartesianRequest,
    data: &ResultSet,
    ctx: &GeometryContext,
) -> Result<CartesianChart, Placeholder> {
    cartesian_chart(request, data, ctx, CartesianStyle::Line)
}

fn cartesian_chart(
    request: &CartesianRequest,
    data: &ResultSet,
    ctx: &GeometryContext,
    style: CartesianStyle,
) -> Result<CartesianChart, Placeholder> {
    if data.is_empty() {
        return Err(Placeholder::NoData);
    }

    let (metrics, multi) = match &request.y {
        Measure::Field(field) => (vec![field.clone()], false),
        Measure::AllNumeric(fields) => (
            fields
                .iter()
                .filter(|f| !f.trim().is_empty())
                .cloned()
                .collect::<Vec<_>>(),
            true,
        ),
    };
    if metrics.is_empty() {
        return Err(Placeholder::NoValidPoints);
    }

    let family = match style {
        CartesianStyle::Bar => ChartFamily::Bar,
        CartesianStyle::Line => ChartFamily::Line,
    };
    let palette = ctx.palettes.palette(family);

    let categories: Vec<String> = data
        .iter()
        .enumerate()
        .map(|(i, record)| raw_category(record, &request.x, i))
        .collect();
    let category_labels: Vec<String> = categories
        .iter()
        .map(|c| display_category(c, &request.x))
        .collect();

    let mut series = Vec::with_capacity(metrics.len());
    for (metric_idx, metric) in metrics.iter().enumerate() {
        let series_color = palette.color_at(metric_idx).to_string();
        let mut points = Vec::new();
        for (record_idx, record) in data.iter().enumerate() {
            let y = match record.get(metric).and_then(Scalar::to_f64_lenient) {
                Some(v) if v.is_finite() => v,
                _ => {
                    tracing::trace!(field = %metric, record = record_idx, "Dropping non-numeric value");
                    continue;
                }
            };
            // A single bar series is colored per bar
            let color = if style == CartesianStyle::Bar && !multi {
                palette.color_at(record_idx).to_string()
            } else {
                series_color.clone()
            };
            points.push(SeriesPoint {
                x: categories[record_idx].clone(),
                y,
                label: ctx.formatter.compact(y),
                color,
                source: record_idx,
            });
        }
        series.push(Series {
            name: metric.clone(),
            label: capitalize_label(metric),
            color: series_color,
            points,
        });
    }

    if series.iter().all(|s| s.points.is_empty()) {
        return Err(Placeholder::NoValidPoints);
    }

    let x_title = x_axis_title(&request.x);
    let legend = if multi {
        Legend {
            title: "Metrics".to_string(),
            entries: series
                .iter()
                .map(|s| LegendEntry {
                    name: s.name.clone(),
                    label: s.label.clone(),
                    color: s.color.clone(),
                })
                .collect(),
        }
    } else {
        match style {
            CartesianStyle::Bar => Legend {
                title: "Categories".to_string(),
                entries: categories
                    .iter()
                    .zip(&category_labels)
                    .take(BAR_LEGEND_LIMIT)
                    .enumerate()
                    .map(|(i, (name, label))| LegendEntry {
                        name: name.clone(),
                        label: label.clone(),
                        color: palette.color_at(i).to_string(),
                    })
                    .collect(),
            },
            CartesianStyle::Line => {
                let assignment = palette.assign(categories.iter().cloned());
                Legend {
                    title: x_title.clone(),
                    entries: assignment
                        .iter()
                        .map(|(name, color)| LegendEntry {
                            name: name.to_string(),
                            label: display_category(name, &request.x),
                            color: color.to_string(),
                        })
                        .collect(),
                }
            }
        }
    };

    let value_name = match &request.y {
        Measure::Field(field) => capitalize_label(field),
        Measure::AllNumeric(_) => "Values".to_string(),
    };
    let title = match (style, multi) {
        (CartesianStyle::Bar, false) => format!("{} Distribution", value_name),
        (CartesianStyle::Bar, true) => "Multi-Metric Analysis".to_string(),
        (CartesianStyle::Line, false) => format!("{} Trend over {}", value_name, x_title),
        (CartesianStyle::Line, true) => format!("Trend of Selected Metrics over {}", x_title),
    };

    let y_ticks = axis_ticks(
        series.iter().flat_map(|s| s.points.iter().map(|p| p.y)),
        &ctx.formatter,
    );

    tracing::debug!(
        series = series.len(),
        categories = categories.len(),
        "Cartesian geometry computed"
    );

    Ok(CartesianChart {
        title,
        x_axis_title: x_title,
        y_axis_title: ctx.y_axis_title(&value_name),
        categories,
        category_labels,
        series,
        legend,
        y_ticks,
    })
}

// =============================================================================
// Pie
// =============================================================================

/// Whether a slice is wide enough for an outside label.
fn shows_outer_label(percent: f64, slice_count: usize) -> bool {
    !((percent < 0.035 && slice_count > 7) || (percent < 0.045 && slice_count > 5))
}

/// One slice per record with a positive value. Blank names become
/// `"Category {i+1}"`.
pub fn pie_chart(
    request: &PieRequest,
    data: &ResultSet,
    ctx: &GeometryContext,
) -> Result<PieChart, Placeholder> {
    if data.is_empty() {
        return Err(Placeholder::NoData);
    }

    let mut kept: Vec<(usize, String, f64)> = Vec::new();
    for (index, record) in data.iter().enumerate() {
        let name = match &request.x {
            AxisChoice::All => format!("Item {}", index + 1),
            AxisChoice::Field(field) => match record.get(field) {
                Some(v) if !v.is_blank() => v.to_string(),
                _ => format!("Category {}", index + 1),
            },
        };
        let value = record
            .get(&request.y)
            .and_then(Scalar::to_f64_lenient)
            .filter(|v| !v.is_nan())
            .unwrap_or(0.0);
        if value > 0.0 && value.is_finite() {
            kept.push((index, name, value));
        } else {
            tracing::trace!(record = index, value, "Dropping non-positive slice");
        }
    }

    if kept.is_empty() {
        return Err(Placeholder::NoValidPoints);
    }

    let palette = ctx.palettes.palette(ChartFamily::Pie);
    let total: f64 = kept.iter().map(|(_, _, v)| v).sum();
    let value_label = capitalize_label(&request.y);
    let slice_count = kept.len();

    let slices: Vec<PieSlice> = kept
        .into_iter()
        .enumerate()
        .map(|(i, (source, name, value))| {
            let percent = value / total;
            let label = capitalize_label(&name);
            let color = palette.color_at(i).to_string();
            let outer_label = shows_outer_label(percent, slice_count)
                .then(|| format!("{} ({}%)", label, to_fixed(percent * 100.0, 0)));
            let tooltip = Tooltip {
                title: label.clone(),
                rows: vec![
                    TooltipRow {
                        label: value_label.clone(),
                        value: format_grouped(value, 0, 3),
                        color: Some(color.clone()),
                    },
                    TooltipRow {
                        label: "Percentage".to_string(),
                        value: format!("{}%", to_fixed(percent * 100.0, 1)),
                        color: Some(color.clone()),
                    },
                ],
            };
            PieSlice {
                name,
                label,
                value,
                percent,
                color,
                source,
                outer_label,
                tooltip,
            }
        })
        .collect();

    let legend = Legend {
        title: x_axis_title(&request.x),
        entries: slices
            .iter()
            .map(|s| LegendEntry {
                name: s.name.clone(),
                label: s.label.clone(),
                color: s.color.clone(),
            })
            .collect(),
    };

    Ok(PieChart {
        value_label,
        total,
        slices,
        legend,
    })
}

// =============================================================================
// Scatter
// =============================================================================

/// Case-insensitive label order; on a tie lowercase sorts first.
fn locale_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Categories on a continuous X axis: each distinct label sits at its index
/// in sorted order.
pub fn scatter_chart(
    request: &ScatterRequest,
    data: &ResultSet,
    ctx: &GeometryContext,
) -> Result<ScatterChart, Placeholder> {
    if data.is_empty() {
        return Err(Placeholder::NoData);
    }

    let y_field = match &request.y {
        AxisChoice::Field(field) => field.clone(),
        AxisChoice::All => first_numeric_field(data).ok_or(Placeholder::NoValidPoints)?,
    };
    if request.x.field() == Some(y_field.as_str()) {
        return Err(Placeholder::SelectAxes);
    }

    // X labels per record; null and missing values have no position
    let x_values: Vec<Option<String>> = data
        .iter()
        .enumerate()
        .map(|(i, record)| match &request.x {
            AxisChoice::All => Some(format!("Item {}", i + 1)),
            AxisChoice::Field(field) => match record.get(field) {
                None | Some(Scalar::Null) => None,
                Some(v) => Some(v.to_string()),
            },
        })
        .collect();

    let mut categories: Vec<String> = x_values.iter().flatten().cloned().collect();
    categories.sort_by(|a, b| locale_order(a, b));
    categories.dedup();

    let palette = ctx.palettes.palette(ChartFamily::Scatter);
    let assignment = palette.assign(categories.iter().cloned());
    let x_title_full = x_axis_title(&request.x);
    let y_title_full = capitalize_label(&y_field);

    let mut points = Vec::new();
    for (index, (record, x)) in data.iter().zip(&x_values).enumerate() {
        let Some(category) = x else {
            continue;
        };
        let y = match record.get(&y_field) {
            Some(v) if !v.is_blank() => v.to_f64_lenient().unwrap_or(f64::NAN),
            _ => f64::NAN,
        };
        if !y.is_finite() {
            tracing::trace!(record = index, "Dropping scatter point without a numeric Y");
            continue;
        }
        let position = categories
            .binary_search_by(|c| locale_order(c, category))
            .unwrap_or_default();
        let color = assignment
            .color_for(category)
            .unwrap_or_else(|| palette.color_at(position))
            .to_string();
        points.push(ScatterPoint {
            category: category.clone(),
            x: position as f64,
            y,
            tooltip: Tooltip {
                title: format!("{}: {}", x_title_full, category),
                rows: vec![TooltipRow {
                    label: y_title_full.clone(),
                    value: format_grouped(y, 2, 2),
                    color: Some(color.clone()),
                }],
            },
            color,
            source: index,
        });
    }

    if points.is_empty() {
        return Err(Placeholder::NoValidPoints);
    }

    let short = |text: &str, max: usize| truncate_label(&capitalize_label(text), max, "...");
    let legend = Legend {
        title: x_title_full.clone(),
        entries: assignment
            .iter()
            .map(|(name, color)| LegendEntry {
                name: name.to_string(),
                label: short(name, SCATTER_LEGEND_MAX_LEN),
                color: color.to_string(),
            })
            .collect(),
    };
    let x_ticks = categories
        .iter()
        .enumerate()
        .map(|(i, c)| AxisTick {
            value: i as f64,
            label: short(c, SCATTER_LEGEND_MAX_LEN),
        })
        .collect();
    let y_ticks = axis_ticks(points.iter().map(|p| p.y), &ctx.formatter);

    Ok(ScatterChart {
        title: format!(
            "{} vs {}",
            short(&y_title_full, SCATTER_TITLE_MAX_LEN),
            short(&x_title_full, SCATTER_TITLE_MAX_LEN)
        ),
        x_axis_title: short(&x_title_full, SCATTER_TITLE_MAX_LEN),
        y_axis_title: ctx.y_axis_title(&y_title_full),
        categories,
        points,
        legend,
        x_ticks,
        y_ticks,
    })
}
