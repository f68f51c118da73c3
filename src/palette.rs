// Categorical palettes and label -> color assignment

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde::Serialize;

const BAR_COLORS: [&str; 20] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#ffeaa7",
    "#dda0dd", "#98d8c8", "#f7dc6f", "#bb8fce", "#85c1e9",
    "#ff9ff3", "#54a0ff", "#7bed9f", "#ffa502", "#ff3838",
    "#70a1ff", "#5f27cd", "#00d2d3", "#ff9f43", "#ee5a52",
];

const LINE_COLORS: [&str; 12] = [
    "#FF6B35", "#2E86AB", "#A23B72", "#F18F01", "#C73E1D",
    "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD",
    "#20B2AA", "#FF7F50",
];

const PIE_COLORS: [&str; 12] = [
    "#34568B", "#FF6F61", "#6B5B95", "#88B04B", "#F7CAC9", "#92A8D1",
    "#955251", "#B565A7", "#009B77", "#DD4124", "#45B8AC", "#EFC050",
];

const SCATTER_COLORS: [&str; 20] = [
    "#264653", "#2A9D8F", "#E9C46A", "#F4A261", "#E76F51",
    "#E57373", "#81C784", "#64B5F6", "#FFB74D", "#BA68C8",
    "#795548", "#A1887F", "#90A4AE", "#78909C", "#4DB6AC",
    "#AED581", "#DCE775", "#FFF176", "#FFD54F", "#FF8A65",
];

const HEATMAP_COLORS: [&str; 20] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
    "#aec7e8", "#ffbb78", "#98df8a", "#ff9896", "#c5b0d5",
    "#c49c94", "#f7b6d2", "#c7c7c7", "#dbdb8d", "#9edae5",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFamily {
    Bar,
    Line,
    Pie,
    Scatter,
    Heatmap,
}

/// Fixed, non-empty, ordered sequence of colors cycled by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    /// Duplicate colors are dropped, keeping first occurrence.
    pub fn new<I, S>(colors: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colors = distinct_in_order(colors.into_iter().map(Into::into));
        if colors.is_empty() {
            bail!("Palette requires at least one color");
        }
        Ok(Self { colors })
    }

    fn from_static(colors: &[&str]) -> Self {
        Self {
            colors: distinct_in_order(colors.iter().map(|c| c.to_string())),
        }
    }

    pub fn for_family(family: ChartFamily) -> Self {
        match family {
            ChartFamily::Bar => Self::from_static(&BAR_COLORS),
            ChartFamily::Line => Self::from_static(&LINE_COLORS),
            ChartFamily::Pie => Self::from_static(&PIE_COLORS),
            ChartFamily::Scatter => Self::from_static(&SCATTER_COLORS),
            ChartFamily::Heatmap => Self::from_static(&HEATMAP_COLORS),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// `palette[index mod N]`
    pub fn color_at(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }

    /// Map each distinct label to `palette[i mod N]`, `i` being its
    /// first-occurrence position.
    pub fn assign<I, S>(&self, labels: I) -> ColorAssignment
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut colors = IndexMap::new();
        for label in labels {
            let next = colors.len();
            colors
                .entry(label.into())
                .or_insert_with(|| self.color_at(next).to_string());
        }
        ColorAssignment { colors }
    }
}

/// Label -> color mapping shared by a plot and its legend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColorAssignment {
    colors: IndexMap<String, String>,
}

impl ColorAssignment {
    pub fn color_for(&self, label: &str) -> Option<&str> {
        self.colors.get(label).map(String::as_str)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.colors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Source of the palette each chart family draws from.
pub trait PaletteProvider {
    fn palette(&self, family: ChartFamily) -> &Palette;
}

#[derive(Debug, Clone)]
pub struct DefaultPalettes {
    bar: Palette,
    line: Palette,
    pie: Palette,
    scatter: Palette,
    heatmap: Palette,
}

impl Default for DefaultPalettes {
    fn default() -> Self {
        Self {
            bar: Palette::for_family(ChartFamily::Bar),
            line: Palette::for_family(ChartFamily::Line),
            pie: Palette::for_family(ChartFamily::Pie),
            scatter: Palette::for_family(ChartFamily::Scatter),
            heatmap: Palette::for_family(ChartFamily::Heatmap),
        }
    }
}

impl PaletteProvider for DefaultPalettes {
    fn palette(&self, family: ChartFamily) -> &Palette {
        match family {
            ChartFamily::Bar => &self.bar,
            ChartFamily::Line => &self.line,
            ChartFamily::Pie => &self.pie,
            ChartFamily::Scatter => &self.scatter,
            ChartFamily::Heatmap => &self.heatmap,
        }
    }
}

/// One palette for every family.
#[derive(Debug, Clone)]
pub struct UniformPalette(pub Palette);

impl PaletteProvider for UniformPalette {
    fn palette(&self, _family: ChartFamily) -> &Palette {
        &self.0
    }
}

/// Deduplicate, keeping first-occurrence order.
pub fn distinct_in_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = indexmap::IndexSet::new();
    for item in items {
        seen.insert(item);
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_wraps_around() {
        let palette = Palette::new(["#000", "#111", "#222"]).unwrap();
        let labels: Vec<String> = (0..7).map(|i| format!("L{}", i)).collect();
        let assignment = palette.assign(labels.iter().cloned());
        for (i, label) in labels.iter().enumerate() {
            assert_eq!(assignment.color_for(label), Some(palette.color_at(i % 3)));
        }
        assert_eq!(assignment.color_for("L3"), Some("#000"));
    }

    #[test]
    fn test_assign_keeps_first_occurrence() {
        let palette = Palette::for_family(ChartFamily::Pie);
        let assignment = palette.assign(["b", "a", "b", "c"]);
        assert_eq!(assignment.labels().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(assignment.color_for("c"), Some("#6B5B95"));
    }

    #[test]
    fn test_empty_palette_rejected() {
        assert!(Palette::new(Vec::<String>::new()).is_err());
        let deduped = Palette::new(["#aaa", "#aaa", "#bbb"]).unwrap();
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn test_family_palettes() {
        let palettes = DefaultPalettes::default();
        assert_eq!(palettes.palette(ChartFamily::Bar).len(), 20);
        assert_eq!(palettes.palette(ChartFamily::Line).len(), 12);
        assert_eq!(palettes.palette(ChartFamily::Pie).len(), 12);
        assert_eq!(palettes.palette(ChartFamily::Scatter).len(), 20);
        assert_eq!(palettes.palette(ChartFamily::Heatmap).color_at(20), "#1f77b4");
    }
}
