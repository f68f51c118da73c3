use crate::classify::{classify, FieldClassification};
use crate::data::{Record, ResultSet};
use crate::ir::{
    CartesianRequest, ChartKind, ChartRequest, ContainerSize, HeatmapRequest, Measure,
    Placeholder, PieRequest, ScatterRequest, TableRequest,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel meaning "row position" on X and "every numeric field" on Y
pub const ALL_SENTINEL: &str = "all";

const MISSING_VALUE_TEXT: &str = "undefined";

/// One axis choice: a field, or the `"all"` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisChoice {
    All,
    Field(String),
}

impl AxisChoice {
    /// `""` means nothing selected.
    pub fn parse(value: &str) -> Option<AxisChoice> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else if value == ALL_SENTINEL {
            Some(AxisChoice::All)
        } else {
            Some(AxisChoice::Field(value.to_string()))
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            AxisChoice::All => None,
            AxisChoice::Field(f) => Some(f),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, AxisChoice::All)
    }
}

impl fmt::Display for AxisChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisChoice::All => f.write_str(ALL_SENTINEL),
            AxisChoice::Field(field) => f.write_str(field),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AxisSelection {
    pub x: Option<AxisChoice>,
    pub y: Option<AxisChoice>,
}

/// Per-view inputs that do not belong to the selection itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewOptions {
    /// 1-based table page
    pub page: usize,
    /// Measured heat-map container; `None` until the host reports a size
    pub container: Option<ContainerSize>,
}

/// The user's axis choices and filter text for the current result set.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    classification: FieldClassification,
    axes: AxisSelection,
    filter_text: String,
}

impl SelectionState {
    pub fn new(data: &ResultSet) -> Self {
        let mut state = Self::default();
        state.on_result_set(data);
        state
    }

    /// Reclassify and reset axes to their defaults: first categorical field
    /// as X, first numeric field as Y. The filter text is kept.
    pub fn on_result_set(&mut self, data: &ResultSet) {
        self.classification = classify(data);
        self.axes = AxisSelection {
            x: self.classification.categorical.first().cloned().map(AxisChoice::Field),
            y: self.classification.numeric.first().cloned().map(AxisChoice::Field),
        };
        tracing::debug!(
            categorical = self.classification.categorical.len(),
            numeric = self.classification.numeric.len(),
            "Result set classified"
        );
    }

    pub fn classification(&self) -> &FieldClassification {
        &self.classification
    }

    pub fn axes(&self) -> &AxisSelection {
        &self.axes
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn select_x(&mut self, choice: Option<AxisChoice>) {
        self.axes.x = choice;
    }

    pub fn select_y(&mut self, choice: Option<AxisChoice>) {
        self.axes.y = choice;
    }

    pub fn set_filter<S: Into<String>>(&mut self, text: S) {
        self.filter_text = text.into();
    }

    /// Fields offered for X.
    pub fn x_options(&self) -> &[String] {
        &self.classification.categorical
    }

    /// Fields offered for Y, never the field currently on X.
    pub fn y_options(&self) -> Vec<&str> {
        let x = self.axes.x.as_ref().and_then(AxisChoice::field);
        self.classification
            .numeric
            .iter()
            .map(String::as_str)
            .filter(|f| Some(*f) != x)
            .collect()
    }

    /// A record without the X field reads as `"undefined"`, null as `"null"`.
    fn matches_filter(&self, record: &Record, field: &str, needle: &str) -> bool {
        record
            .get(field)
            .map(|v| v.to_string())
            .unwrap_or_else(|| MISSING_VALUE_TEXT.to_string())
            .to_lowercase()
            .contains(needle)
    }

    /// Records whose X value contains the filter text, ignoring case. No-op
    /// when X is `"all"`, unset, or the filter is empty.
    pub fn filtered(&self, data: &ResultSet) -> ResultSet {
        let field = match self.axes.x.as_ref().and_then(AxisChoice::field) {
            Some(field) if !self.filter_text.is_empty() => field,
            _ => return data.clone(),
        };
        let needle = self.filter_text.to_lowercase();
        data.filtered(|record| self.matches_filter(record, field, &needle))
    }

    /// Build the request for `kind` from the current selection.
    pub fn request(&self, kind: ChartKind, options: &ViewOptions) -> Result<ChartRequest, Placeholder> {
        if kind == ChartKind::Table {
            return Ok(ChartRequest::Table(TableRequest { page: options.page.max(1) }));
        }

        let (x, y) = match (&self.axes.x, &self.axes.y) {
            (Some(x), Some(y)) => (x.clone(), y.clone()),
            _ => return Err(Placeholder::SelectAxes),
        };

        let request = match kind {
            ChartKind::Bar | ChartKind::Line => {
                let y = match y {
                    AxisChoice::All => Measure::AllNumeric(self.classification.numeric.clone()),
                    AxisChoice::Field(f) => Measure::Field(f),
                };
                let cartesian = CartesianRequest { x, y };
                if kind == ChartKind::Bar {
                    ChartRequest::Bar(cartesian)
                } else {
                    ChartRequest::Line(cartesian)
                }
            }
            ChartKind::Pie => match y {
                AxisChoice::Field(y) => ChartRequest::Pie(PieRequest { x, y }),
                AxisChoice::All => return Err(Placeholder::SelectAxes),
            },
            ChartKind::ScatterPlot => ChartRequest::Scatter(ScatterRequest { x, y }),
            ChartKind::HeatMap => match y {
                AxisChoice::Field(y) => ChartRequest::HeatMap(HeatmapRequest {
                    x,
                    y,
                    container: options.container.unwrap_or_default(),
                }),
                AxisChoice::All => return Err(Placeholder::SelectAxes),
            },
            ChartKind::Table => ChartRequest::Table(TableRequest { page: options.page.max(1) }),
        };
        Ok(request)
    }
}
