//! PNG previews of computed chart geometry.
//!
//! Shapes are drawn in pixel space with `plotters` on an RGB buffer and
//! encoded with `image`. Text is best effort: on hosts without a usable
//! font the labels are skipped and the shapes still render.

use crate::heatmap::HeatmapLayout;
use crate::ir::{CartesianChart, ChartOutput, HeatmapChart, PieChart, ScatterChart};
use crate::scale::AxisTick;
use crate::table::TableView;
use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;
type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const AXIS_COLOR: RGBColor = RGBColor(0xcb, 0xd5, 0xe0);
const TEXT_COLOR: RGBColor = RGBColor(0x2d, 0x37, 0x48);

/// Render `output` into PNG bytes of the given size.
pub fn render_png(output: &ChartOutput, width: u32, height: u32) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        bail!("Preview size must be positive (got {}x{})", width, height);
    }

    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        match output {
            ChartOutput::Bar(chart) => draw_bars(&root, chart)?,
            ChartOutput::Line(chart) => draw_lines(&root, chart)?,
            ChartOutput::Pie(chart) => draw_pie(&root, chart)?,
            ChartOutput::Scatter(chart) => draw_scatter(&root, chart)?,
            ChartOutput::HeatMap(chart) => draw_heatmap(&root, chart)?,
            ChartOutput::Table(view) => draw_table(&root, view),
            ChartOutput::Placeholder(p) => draw_message(&root, p.message()),
            ChartOutput::Failed { message } => {
                draw_message(&root, &format!("Chart failed: {}", message))
            }
        }

        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(&buffer, width, height, image::ColorType::Rgb8)
        .context("Failed to encode PNG")?;

    Ok(png_bytes)
}

fn hex_rgb(hex: &str) -> Option<RGBColor> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(RGBColor(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => Some(RGBColor(
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        )),
        _ => None,
    }
}

/// Parse `#rrggbb`, `#rgb` or a basic color name. Unknown input is blue.
pub fn parse_hex_color(color: &str) -> RGBColor {
    let color = color.trim();
    if let Some(rgb) = color.strip_prefix('#').and_then(hex_rgb) {
        return rgb;
    }
    match color {
        "red" => RED,
        "green" => GREEN,
        "black" => BLACK,
        "white" => WHITE,
        _ => BLUE,
    }
}

fn draw_label(area: &Area<'_>, text: &str, pos: (i32, i32), size: u32) {
    let style = ("sans-serif", size).into_font().color(&TEXT_COLOR);
    if let Err(e) = area.draw_text(text, &style, pos) {
        tracing::debug!(error = %e, "Skipping label");
    }
}

fn draw_message(area: &Area<'_>, message: &str) {
    let (w, h) = area.dim_in_pixel();
    draw_label(area, message, (20, (h / 2) as i32), 18);
    tracing::debug!(width = w, height = h, "Drew message preview");
}

// =============================================================================
// Cartesian frame
// =============================================================================

/// Plot rectangle and the value range mapped onto it.
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn new(dims: (u32, u32), ticks: &[AxisTick]) -> Self {
        let (y_min, y_max) = match (ticks.first(), ticks.last()) {
            (Some(a), Some(b)) if b.value > a.value => (a.value, b.value),
            _ => (0.0, 1.0),
        };
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: (dims.0 as f64 - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
            height: (dims.1 as f64 - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
            y_min,
            y_max,
        }
    }

    fn y(&self, value: f64) -> i32 {
        let t = (value - self.y_min) / (self.y_max - self.y_min);
        (self.top + self.height * (1.0 - t)).round() as i32
    }

    fn x(&self, fraction: f64) -> i32 {
        (self.left + self.width * fraction).round() as i32
    }

    fn bottom(&self) -> i32 {
        (self.top + self.height).round() as i32
    }
}

fn draw_axes(
    area: &Area<'_>,
    frame: &Frame,
    title: &str,
    ticks: &[AxisTick],
) -> Result<()> {
    let left = frame.x(0.0);
    let right = frame.x(1.0);
    let top = frame.top.round() as i32;
    area.draw(&PathElement::new(
        vec![(left, top), (left, frame.bottom()), (right, frame.bottom())],
        AXIS_COLOR.stroke_width(2),
    ))
    .context("Failed to draw axes")?;

    for tick in ticks {
        let y = frame.y(tick.value);
        area.draw(&PathElement::new(vec![(left - 4, y), (left, y)], AXIS_COLOR))
            .context("Failed to draw tick")?;
        draw_label(area, &tick.label, (8, y - 6), 12);
    }
    draw_label(area, title, (left, 10), 18);
    Ok(())
}

fn draw_bars(area: &Area<'_>, chart: &CartesianChart) -> Result<()> {
    let frame = Frame::new(area.dim_in_pixel(), &chart.y_ticks);
    draw_axes(area, &frame, &chart.title, &chart.y_ticks)?;

    let num_categories = chart.categories.len().max(1) as f64;
    let num_series = chart.series.len().max(1) as f64;
    // Side-by-side bars within each category slot
    let bar_width = 0.8 / num_series;
    let baseline = frame.y(0.0_f64.clamp(frame.y_min, frame.y_max));

    for (series_idx, series) in chart.series.iter().enumerate() {
        for point in &series.points {
            let x_offset = (series_idx as f64 - (num_series - 1.0) / 2.0) * bar_width;
            let x_center = point.source as f64 + 0.5 + x_offset;
            let x0 = frame.x((x_center - bar_width / 2.0) / num_categories);
            let x1 = frame.x((x_center + bar_width / 2.0) / num_categories);
            let color = parse_hex_color(&point.color);
            area.draw(&Rectangle::new([(x0, baseline), (x1, frame.y(point.y))], color.filled()))
                .context("Failed to draw bar")?;
        }
    }
    Ok(())
}

fn draw_lines(area: &Area<'_>, chart: &CartesianChart) -> Result<()> {
    let frame = Frame::new(area.dim_in_pixel(), &chart.y_ticks);
    draw_axes(area, &frame, &chart.title, &chart.y_ticks)?;

    let num_categories = chart.categories.len().max(1) as f64;
    for series in &chart.series {
        let points: Vec<(i32, i32)> = series
            .points
            .iter()
            .map(|p| (frame.x((p.source as f64 + 0.5) / num_categories), frame.y(p.y)))
            .collect();
        let color = parse_hex_color(&series.color);
        area.draw(&PathElement::new(points, color.stroke_width(3)))
            .context("Failed to draw line series")?;
    }
    Ok(())
}

fn draw_scatter(area: &Area<'_>, chart: &ScatterChart) -> Result<()> {
    let frame = Frame::new(area.dim_in_pixel(), &chart.y_ticks);
    draw_axes(area, &frame, &chart.title, &chart.y_ticks)?;

    let slots = chart.categories.len().max(1) as f64;
    for point in &chart.points {
        let center = (frame.x((point.x + 0.5) / slots), frame.y(point.y));
        let color = parse_hex_color(&point.color);
        area.draw(&Circle::new(center, 6, color.filled()))
            .context("Failed to draw point")?;
    }
    for tick in &chart.x_ticks {
        draw_label(area, &tick.label, (frame.x((tick.value + 0.5) / slots) - 10, frame.bottom() + 8), 11);
    }
    Ok(())
}

// =============================================================================
// Pie and heat map
// =============================================================================

fn draw_pie(area: &Area<'_>, chart: &PieChart) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let center = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = (w.min(h) as f64 / 2.0 - 40.0).max(10.0);

    let mut start = -std::f64::consts::FRAC_PI_2;
    for slice in &chart.slices {
        let sweep = slice.percent * std::f64::consts::TAU;
        let steps = ((sweep / 0.05).ceil() as usize).max(1);
        let mut points = vec![(center.0.round() as i32, center.1.round() as i32)];
        for i in 0..=steps {
            let angle = start + sweep * i as f64 / steps as f64;
            points.push((
                (center.0 + radius * angle.cos()).round() as i32,
                (center.1 + radius * angle.sin()).round() as i32,
            ));
        }
        let color = parse_hex_color(&slice.color);
        area.draw(&Polygon::new(points, color.filled()))
            .context("Failed to draw slice")?;

        if let Some(label) = &slice.outer_label {
            let mid = start + sweep / 2.0;
            let pos = (
                (center.0 + (radius + 12.0) * mid.cos()).round() as i32,
                (center.1 + (radius + 12.0) * mid.sin()).round() as i32,
            );
            draw_label(area, label, pos, 11);
        }
        start += sweep;
    }
    Ok(())
}

fn draw_heatmap(area: &Area<'_>, chart: &HeatmapChart) -> Result<()> {
    let HeatmapLayout {
        natural_width,
        natural_height,
        cell_width,
        cell_height,
        regions,
        ..
    } = chart.layout;

    // Fit the natural layout to the canvas, same uniform shrink as the host
    let (w, h) = area.dim_in_pixel();
    let scale = (w as f64 / natural_width).min(h as f64 / natural_height).min(1.0);
    let px = |v: f64| (v * scale).round() as i32;

    draw_label(area, &chart.title, (px(regions.grid.x), 2), 16);

    for (row_idx, row) in chart.rows.iter().enumerate() {
        let y0 = regions.grid.y + row_idx as f64 * cell_height;
        for (col_idx, cell) in row.iter().enumerate() {
            let x0 = regions.grid.x + col_idx as f64 * cell_width;
            let color = parse_hex_color(&cell.color);
            area.draw(&Rectangle::new(
                [(px(x0), px(y0)), (px(x0 + cell_width) - 1, px(y0 + cell_height) - 1)],
                color.filled(),
            ))
            .context("Failed to draw cell")?;
            draw_label(area, &cell.text, (px(x0 + 4.0), px(y0 + cell_height / 3.0)), 10);
        }
        if let Some(label) = chart.y_tick_labels.get(row_idx) {
            draw_label(area, label, (px(regions.y_ticks.x), px(y0 + cell_height / 3.0)), 10);
        }
    }

    for (i, entry) in chart.legend.entries.iter().enumerate() {
        let y = regions.legend.y + 20.0 + i as f64 * 16.0;
        let color = parse_hex_color(&entry.color);
        area.draw(&Rectangle::new(
            [(px(regions.legend.x), px(y)), (px(regions.legend.x + 10.0), px(y + 10.0))],
            color.filled(),
        ))
        .context("Failed to draw legend swatch")?;
        draw_label(area, &entry.label, (px(regions.legend.x + 14.0), px(y)), 10);
    }
    draw_label(area, &chart.x_axis_title, (px(regions.x_title.x), px(regions.x_title.y)), 12);
    Ok(())
}

fn draw_table(area: &Area<'_>, view: &TableView) {
    let row_height = 20;
    draw_label(area, &view.columns.join(" | "), (10, 10), 13);
    for (i, row) in view.rows.iter().enumerate() {
        draw_label(area, &row.join(" | "), (10, 10 + row_height * (i as i32 + 1)), 12);
    }
    let footer = format!("Page {} of {}", view.page, view.total_pages);
    draw_label(area, &footer, (10, 10 + row_height * (view.rows.len() as i32 + 2)), 12);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Placeholder;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff6b6b"), RGBColor(0xff, 0x6b, 0x6b));
        assert_eq!(parse_hex_color("#fff"), RGBColor(0xff, 0xff, 0xff));
        assert_eq!(parse_hex_color("red"), RED);
        assert_eq!(parse_hex_color("#zzzzzz"), BLUE);
    }

    #[test]
    fn test_placeholder_png() {
        let bytes = render_png(&ChartOutput::Placeholder(Placeholder::NoData), 120, 80).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(render_png(&ChartOutput::Placeholder(Placeholder::NoData), 0, 10).is_err());
    }
}
