// Chart dispatch with a per-chart fault boundary

use crate::config::DashboardConfig;
use crate::data::ResultSet;
use crate::geometry::{self, GeometryContext};
use crate::heatmap;
use crate::ir::{ChartKind, ChartOutput, ChartRequest, Placeholder};
use crate::palette::{DefaultPalettes, PaletteProvider};
use crate::selection::{SelectionState, ViewOptions};
use crate::table;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Settings and services shared by every chart of one render pass.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub config: &'a DashboardConfig,
    pub palettes: &'a dyn PaletteProvider,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a DashboardConfig, palettes: &'a dyn PaletteProvider) -> Self {
        Self { config, palettes }
    }

    fn geometry(&self) -> GeometryContext<'a> {
        GeometryContext {
            formatter: self.config.formatter(),
            palettes: self.palettes,
            y_axis_unit: &self.config.y_axis_unit,
        }
    }
}

/// Owns a default configuration and palette set for callers that do not
/// bring their own.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub config: DashboardConfig,
    pub palettes: DefaultPalettes,
}

impl Renderer {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            palettes: DefaultPalettes::default(),
        }
    }

    pub fn context(&self) -> RenderContext<'_> {
        RenderContext::new(&self.config, &self.palettes)
    }

    pub fn render(&self, request: &ChartRequest, data: &ResultSet) -> ChartOutput {
        render_chart(request, data, &self.context())
    }
}

fn dispatch(request: &ChartRequest, data: &ResultSet, ctx: &RenderContext) -> Result<ChartOutput, Placeholder> {
    let geo = ctx.geometry();
    let output = match request {
        ChartRequest::Table(req) => {
            if data.is_empty() {
                return Err(Placeholder::NoData);
            }
            ChartOutput::Table(table::table_page(data, ctx.config.page_size, req.page))
        }
        ChartRequest::Bar(req) => ChartOutput::Bar(geometry::bar_chart(req, data, &geo)?),
        ChartRequest::Line(req) => ChartOutput::Line(geometry::line_chart(req, data, &geo)?),
        ChartRequest::Pie(req) => ChartOutput::Pie(geometry::pie_chart(req, data, &geo)?),
        ChartRequest::Scatter(req) => ChartOutput::Scatter(geometry::scatter_chart(req, data, &geo)?),
        ChartRequest::HeatMap(req) => {
            ChartOutput::HeatMap(heatmap::heatmap_chart(req, data, &geo, &ctx.config.heatmap)?)
        }
    };
    Ok(output)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown rendering fault".to_string()
    }
}

/// Compute one chart. Empty and invalid inputs become placeholders; a fault
/// inside the computation becomes `ChartOutput::Failed` for this chart only.
pub fn render_chart(request: &ChartRequest, data: &ResultSet, ctx: &RenderContext) -> ChartOutput {
    let kind = request.kind();
    run_isolated(kind, || dispatch(request, data, ctx))
}

/// Run a chart computation inside the isolation boundary.
pub fn run_isolated<F>(kind: ChartKind, compute: F) -> ChartOutput
where
    F: FnOnce() -> Result<ChartOutput, Placeholder>,
{
    match panic::catch_unwind(AssertUnwindSafe(compute)) {
        Ok(Ok(output)) => output,
        Ok(Err(placeholder)) => {
            tracing::debug!(%kind, placeholder = placeholder.as_str(), "Chart resolved to placeholder");
            ChartOutput::Placeholder(placeholder)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(%kind, %message, "Chart rendering failed");
            ChartOutput::Failed { message }
        }
    }
}

/// Filter by the current selection and compute the chart of `kind`.
pub fn render_view(
    kind: ChartKind,
    state: &SelectionState,
    data: &ResultSet,
    options: &ViewOptions,
    ctx: &RenderContext,
) -> ChartOutput {
    let filtered = state.filtered(data);
    if filtered.is_empty() {
        return ChartOutput::Placeholder(Placeholder::NoData);
    }
    match state.request(kind, options) {
        Ok(request) => render_chart(&request, &filtered, ctx),
        Err(placeholder) => ChartOutput::Placeholder(placeholder),
    }
}

/// Compute several charts over the same selection. Each is isolated from
/// the others.
pub fn render_views(
    kinds: &[ChartKind],
    state: &SelectionState,
    data: &ResultSet,
    options: &ViewOptions,
    ctx: &RenderContext,
) -> Vec<(ChartKind, ChartOutput)> {
    kinds
        .iter()
        .map(|&kind| (kind, render_view(kind, state, data, options, ctx)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CartesianRequest, Measure, TableRequest};
    use crate::selection::AxisChoice;
    use serde_json::json;

    fn sample() -> ResultSet {
        ResultSet::from_json(&json!([
            {"country": "UAE", "gdp": 100},
            {"country": "KSA", "gdp": 200}
        ]))
        .unwrap()
    }

    #[test]
    fn test_dispatch_bar() {
        let renderer = Renderer::default();
        let request = ChartRequest::Bar(CartesianRequest {
            x: AxisChoice::Field("country".into()),
            y: Measure::Field("gdp".into()),
        });
        match renderer.render(&request, &sample()) {
            ChartOutput::Bar(chart) => assert_eq!(chart.categories, vec!["UAE", "KSA"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_table_empty_is_no_data() {
        let renderer = Renderer::default();
        let request = ChartRequest::Table(TableRequest { page: 1 });
        assert_eq!(
            renderer.render(&request, &ResultSet::default()).placeholder(),
            Some(Placeholder::NoData)
        );
    }

    #[test]
    fn test_fault_is_isolated() {
        let output = run_isolated(ChartKind::Bar, || panic!("boom"));
        assert_eq!(output, ChartOutput::Failed { message: "boom".to_string() });
    }

    #[test]
    fn test_render_views_mixed() {
        let renderer = Renderer::default();
        let data = sample();
        let state = SelectionState::new(&data);
        let outputs = render_views(
            &[ChartKind::Bar, ChartKind::HeatMap, ChartKind::Table],
            &state,
            &data,
            &ViewOptions::default(),
            &renderer.context(),
        );
        assert!(matches!(outputs[0].1, ChartOutput::Bar(_)));
        assert_eq!(outputs[1].1.placeholder(), Some(Placeholder::Initializing));
        assert!(matches!(outputs[2].1, ChartOutput::Table(_)));
    }
}
