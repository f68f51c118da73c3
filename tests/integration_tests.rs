use approx::assert_relative_eq;
use proptest::prelude::*;
use querydash::format::format_compact_number;
use querydash::heatmap::{build_grid, compute_layout, HeatmapConstants};
use querydash::history::{HistoryStore, JsonFileHistory, Role};
use querydash::palette::{ChartFamily, Palette};
use querydash::{
    render_view, AxisChoice, ChartKind, ChartOutput, ContainerSize, Placeholder, Renderer,
    ResultSet, SelectionState, ViewOptions,
};
use serde_json::json;
use std::io::Write;
use std::process::{Command, Stdio};

/// Run the querydash binary with `args`, feeding `stdin` to it
fn run_querydash(args: &[&str], stdin: &str) -> Result<Vec<u8>, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_querydash"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut input) = child.stdin.take() {
        input
            .write_all(stdin.as_bytes())
            .map_err(|e| format!("Failed to write to stdin: {}", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn gdp() -> ResultSet {
    ResultSet::from_json(&json!([
        {"country": "UAE", "gdp": 100},
        {"country": "KSA", "gdp": 200}
    ]))
    .unwrap()
}

fn view(kind: ChartKind, state: &SelectionState, data: &ResultSet, options: ViewOptions) -> ChartOutput {
    let renderer = Renderer::default();
    render_view(kind, state, data, &options, &renderer.context())
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_bar_country_gdp() {
    let data = gdp();
    let state = SelectionState::new(&data);
    let ChartOutput::Bar(chart) = view(ChartKind::Bar, &state, &data, ViewOptions::default()) else {
        panic!("expected a bar chart");
    };

    assert_eq!(chart.category_labels, vec!["Uae", "Ksa"]);
    assert_eq!(chart.series.len(), 1);
    let values: Vec<f64> = chart.series[0].points.iter().map(|p| p.y).collect();
    assert_eq!(values, vec![100.0, 200.0]);

    let ticks: Vec<&str> = chart.y_ticks.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(ticks, vec!["0", "50", "100", "150", "200"]);
}

#[test]
fn test_bar_x_all_items() {
    let data = gdp();
    let mut state = SelectionState::new(&data);
    state.select_x(AxisChoice::parse("all"));
    let ChartOutput::Bar(chart) = view(ChartKind::Bar, &state, &data, ViewOptions::default()) else {
        panic!("expected a bar chart");
    };
    assert_eq!(chart.categories, vec!["Item 1", "Item 2"]);
    assert_eq!(chart.x_axis_title, "Item");
}

#[test]
fn test_pie_drops_non_positive() {
    let data = ResultSet::from_json(&json!([
        {"k": "a", "v": 5},
        {"k": "b", "v": 0},
        {"k": "c", "v": -3},
        {"k": "d", "v": 7}
    ]))
    .unwrap();
    let state = SelectionState::new(&data);
    let ChartOutput::Pie(chart) = view(ChartKind::Pie, &state, &data, ViewOptions::default()) else {
        panic!("expected a pie chart");
    };
    let values: Vec<f64> = chart.slices.iter().map(|s| s.value).collect();
    assert_eq!(values, vec![5.0, 7.0]);
    assert_relative_eq!(chart.total, 12.0);
}

#[test]
fn test_scatter_position() {
    let data = ResultSet::from_json(&json!([
        {"k": "c", "v": 3},
        {"k": "b", "v": 2},
        {"k": "a", "v": 1}
    ]))
    .unwrap();
    let state = SelectionState::new(&data);
    let ChartOutput::Scatter(chart) = view(ChartKind::ScatterPlot, &state, &data, ViewOptions::default())
    else {
        panic!("expected a scatter chart");
    };
    assert_eq!(chart.categories, vec!["a", "b", "c"]);
    let b = chart.points.iter().find(|p| p.category == "b").unwrap();
    assert_relative_eq!(b.x, 1.0);
}

#[test]
fn test_table_pages() {
    let items: Vec<_> = (0..25).map(|i| json!({"id": i})).collect();
    let data = ResultSet::from_json(&serde_json::Value::Array(items)).unwrap();
    let state = SelectionState::new(&data);

    let ChartOutput::Table(page3) = view(ChartKind::Table, &state, &data, ViewOptions { page: 3, container: None })
    else {
        panic!("expected a table");
    };
    assert_eq!(page3.total_pages, 3);
    assert_eq!(page3.rows.len(), 5);

    let ChartOutput::Table(page4) = view(ChartKind::Table, &state, &data, ViewOptions { page: 4, container: None })
    else {
        panic!("expected a table");
    };
    assert_eq!(page4.page, 3);
}

#[test]
fn test_heatmap_descending_y() {
    let data = ResultSet::from_json(&json!([
        {"k": "a", "v": 10},
        {"k": "b", "v": 30},
        {"k": "c", "v": 20}
    ]))
    .unwrap();
    let grid = build_grid(&data, &AxisChoice::Field("k".into()), "v").unwrap();
    assert_eq!(grid.y_labels, vec![30.0, 20.0, 10.0]);

    let state = SelectionState::new(&data);
    let options = ViewOptions {
        page: 1,
        container: Some(ContainerSize::new(900.0, 400.0)),
    };
    let ChartOutput::HeatMap(chart) = view(ChartKind::HeatMap, &state, &data, options) else {
        panic!("expected a heat map");
    };
    assert_eq!(chart.y_labels, vec![30.0, 20.0, 10.0]);
    assert_eq!(chart.rows.len(), 3);
    assert!(chart.layout.scale > 0.0);
}

#[test]
fn test_filter_then_empty_is_no_data() {
    let data = gdp();
    let mut state = SelectionState::new(&data);
    state.set_filter("qatar");
    let output = view(ChartKind::Line, &state, &data, ViewOptions::default());
    assert_eq!(output.placeholder(), Some(Placeholder::NoData));
}

#[test]
fn test_compact_number_examples() {
    assert_eq!(format_compact_number(999.0), "999");
    assert_eq!(format_compact_number(1500.0), "1.5k");
    assert_eq!(format_compact_number(2_500_000.0), "2.5M");
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_layout_fits_container(
        width in 300.0f64..3000.0,
        height in 200.0f64..2000.0,
        x_count in 1usize..40,
        y_count in 1usize..30,
    ) {
        let constants = HeatmapConstants::default();
        let layout = compute_layout(ContainerSize::new(width, height), x_count, y_count, &constants).unwrap();
        prop_assert!(layout.scale > 0.0);
        prop_assert!(layout.scaled_width <= layout.available_width + 1e-6);
        prop_assert!(layout.scaled_height <= layout.available_height + 1e-6);
    }

    #[test]
    fn prop_assignment_is_idempotent(labels in prop::collection::vec("[a-z]{1,4}", 0..30)) {
        let palette = Palette::for_family(ChartFamily::Bar);
        let first = palette.assign(labels.iter().cloned());
        let second = palette.assign(labels.iter().cloned());
        prop_assert_eq!(&first, &second);
        for (i, label) in first.labels().enumerate() {
            prop_assert_eq!(first.color_for(label), Some(palette.color_at(i)));
        }
    }

    #[test]
    fn prop_classification_partitions_fields(values in prop::collection::vec(-1e6f64..1e6, 1..10)) {
        let items: Vec<_> = values.iter().map(|v| json!({"name": "n", "value": v})).collect();
        let data = ResultSet::from_json(&serde_json::Value::Array(items)).unwrap();
        let c = querydash::classify(&data);
        prop_assert_eq!(c.categorical.clone(), vec!["name".to_string()]);
        prop_assert_eq!(c.numeric.clone(), vec!["value".to_string()]);
        prop_assert_eq!(querydash::classify(&data), c);
    }
}

// =============================================================================
// History storage
// =============================================================================

#[test]
fn test_json_file_history_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let mut store = JsonFileHistory::new(&path);
    assert!(store.load(Role::User).unwrap().is_empty());
    assert!(store.append(Role::User, "gdp by country").unwrap());
    assert!(store.append(Role::Admin, "list tables").unwrap());
    assert!(store.append(Role::User, "population trend").unwrap());

    let reopened = JsonFileHistory::new(&path);
    assert_eq!(
        reopened.load(Role::User).unwrap(),
        vec!["gdp by country", "population trend"]
    );

    assert!(store.remove(Role::User, 0).unwrap());
    assert!(!store.remove(Role::User, 7).unwrap());
    assert_eq!(store.load(Role::User).unwrap(), vec!["population trend"]);
    assert_eq!(store.load(Role::Admin).unwrap(), vec!["list tables"]);
}

#[test]
fn test_json_file_history_corrupt() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{not json").unwrap();
    let store = JsonFileHistory::new(file.path());
    assert!(store.load(Role::User).is_err());
}

// =============================================================================
// Command line
// =============================================================================

#[test]
fn test_cli_bar_json() {
    let input = r#"[{"country": "UAE", "gdp": 100}, {"country": "KSA", "gdp": 200}]"#;
    let stdout = run_querydash(&["render", "bar"], input).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(value["type"], "bar");
    assert_eq!(value["chart"]["category_labels"], json!(["Uae", "Ksa"]));
}

#[test]
fn test_cli_csv_placeholder() {
    let stdout = run_querydash(&["render", "pie", "--input", "csv", "--y", "all"], "name,value\na,1\n").unwrap();
    let value: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(value["chart"], "select-axes");
}

#[test]
fn test_cli_png_preview() {
    let stdout = run_querydash(&["render", "table", "--png", "--width", "200", "--height", "120"], "[]").unwrap();
    assert!(is_valid_png(&stdout), "Output is not a valid PNG");
}

#[test]
fn test_cli_fields() {
    let stdout = run_querydash(&["fields"], r#"[{"a": "x", "b": "2"}]"#).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(value, json!({"categorical": ["a"], "numeric": ["b"]}));
}

#[test]
fn test_cli_history() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("h.json");
    let file = file.to_str().unwrap();
    run_querydash(&["history", "--file", file, "--role", "admin", "add", "show revenue"], "").unwrap();
    let listed = run_querydash(&["history", "--file", file, "--role", "admin", "list"], "").unwrap();
    assert_eq!(String::from_utf8(listed).unwrap(), "0\tshow revenue\n");
}

#[test]
fn test_cli_rejects_bad_input() {
    assert!(run_querydash(&["render", "bar"], "not json").is_err());
    assert!(run_querydash(&["render", "radar"], "[]").is_err());
}
