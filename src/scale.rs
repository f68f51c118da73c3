use crate::format::ValueFormatter;
use serde::Serialize;

/// Default number of ticks on a value axis
pub const DEFAULT_TICK_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

/// Min/max over finite values. Value axes always include 0.
pub fn value_domain<I>(values: I) -> Domain
where
    I: IntoIterator<Item = f64>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for val in values.into_iter().filter(|v| v.is_finite()) {
        if val < min { min = val; }
        if val > max { max = val; }
    }

    // Handle empty case
    if min == f64::INFINITY {
        return Domain { min: 0.0, max: 1.0 };
    }

    if min > 0.0 { min = 0.0; }
    if max < 0.0 { max = 0.0; }
    if min == max { max = min + 1.0; }

    Domain { min, max }
}

/// Step of 1, 2, 2.5, 5 or 10 times a power of ten that covers the domain in
/// about `count - 1` intervals.
fn nice_step(span: f64, count: usize) -> f64 {
    let intervals = count.saturating_sub(1).max(1) as f64;
    let raw = span / intervals;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let factor = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 2.5 {
        2.5
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

/// Evenly spaced round tick values covering the domain.
pub fn nice_ticks(domain: Domain, count: usize) -> Vec<f64> {
    let span = domain.max - domain.min;
    if !span.is_finite() || span <= 0.0 {
        return vec![domain.min];
    }

    let step = nice_step(span, count);
    let start = (domain.min / step).floor();
    let end = (domain.max / step).ceil();

    let steps = (end - start).round() as i64;
    (0..=steps)
        .map(|i| {
            let value = (start + i as f64) * step;
            // Snap away float noise such as 0.30000000000000004
            let snapped = (value / step).round() * step;
            if snapped == 0.0 { 0.0 } else { snapped }
        })
        .collect()
}

/// Formatted ticks for a value axis over the given values.
pub fn axis_ticks<I>(values: I, formatter: &ValueFormatter) -> Vec<AxisTick>
where
    I: IntoIterator<Item = f64>,
{
    nice_ticks(value_domain(values), DEFAULT_TICK_COUNT)
        .into_iter()
        .map(|value| AxisTick {
            value,
            label: formatter.compact(value),
        })
        .collect()
}
