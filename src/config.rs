use crate::format::{RoundingRule, ValueFormatter};
use crate::heatmap::HeatmapConstants;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_page_size() -> usize {
    10
}

fn default_y_axis_unit() -> String {
    "(in Million AED)".to_string()
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

/// Pixel size of PNG previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Dashboard settings. Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows per table page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub rounding: RoundingRule,
    #[serde(default)]
    pub heatmap: HeatmapConstants,
    #[serde(default)]
    pub canvas: CanvasSize,
    /// Appended to value-axis titles
    #[serde(default = "default_y_axis_unit")]
    pub y_axis_unit: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            rounding: RoundingRule::default(),
            heatmap: HeatmapConstants::default(),
            canvas: CanvasSize::default(),
            y_axis_unit: default_y_axis_unit(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid dashboard configuration")
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("In config file {}", path.display()))
    }

    pub fn formatter(&self) -> ValueFormatter {
        ValueFormatter::new(self.rounding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = DashboardConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.heatmap.cell_height, 35.0);
        assert_eq!(config.canvas.width, 800);
    }

    #[test]
    fn test_partial_override() {
        let config = DashboardConfig::from_json_str(
            r#"{"page_size": 5, "rounding": "one_decimal", "heatmap": {"max_cell_width": 90}, "y_axis_unit": ""}"#,
        )
        .unwrap();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.rounding, RoundingRule::OneDecimal);
        assert_eq!(config.heatmap.max_cell_width, 90.0);
        assert_eq!(config.heatmap.min_cell_width, 30.0);
        assert_eq!(config.formatter().compact(2000.0), "2.0k");
        assert!(config.y_axis_unit.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        assert!(DashboardConfig::from_json_str(r#"{"rounding": "banker"}"#).is_err());
        assert!(DashboardConfig::from_path("/nonexistent/querydash.json").is_err());
    }
}
