// Library exports for querydash

pub mod classify;
pub mod config;
pub mod data;
pub mod format;
pub mod geometry;
pub mod heatmap;
pub mod history;
pub mod ir;
pub mod numeric;
pub mod palette;
pub mod preview;
pub mod runtime;
pub mod scale;
pub mod selection;
pub mod table;
pub mod telemetry;

pub use classify::{classify, FieldClassification, FieldKind};
pub use config::DashboardConfig;
pub use data::{Record, ResultSet, Scalar};
pub use ir::{ChartKind, ChartOutput, ChartRequest, ContainerSize, Placeholder};
pub use runtime::{render_chart, render_view, render_views, RenderContext, Renderer};
pub use selection::{AxisChoice, SelectionState, ViewOptions};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "json")]
    #[default]
    Json,
    #[serde(rename = "png")]
    Png,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Json,
        }
    }
}

/// Serialize a computed chart in the requested format.
pub fn encode_output(output: &ChartOutput, options: &RenderOptions) -> Result<Vec<u8>> {
    match options.format {
        OutputFormat::Json => {
            let mut bytes =
                serde_json::to_vec_pretty(output).context("Failed to serialize chart output")?;
            bytes.push(b'\n');
            Ok(bytes)
        }
        OutputFormat::Png => preview::render_png(output, options.width, options.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_defaults() {
        let opts: RenderOptions = serde_json::from_str(r#"{"type": "png"}"#).unwrap();
        assert_eq!(opts.format, OutputFormat::Png);
        assert_eq!((opts.width, opts.height), (800, 600));
    }

    #[test]
    fn test_encode_placeholder_json() {
        let bytes = encode_output(
            &ChartOutput::Placeholder(Placeholder::SelectAxes),
            &RenderOptions::default(),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "placeholder");
        assert_eq!(value["chart"], "select-axes");
    }
}
