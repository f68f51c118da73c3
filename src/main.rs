use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use querydash::history::{HistoryStore, JsonFileHistory, Role};
use querydash::{
    encode_output, render_view, AxisChoice, ChartKind, ContainerSize, DashboardConfig,
    OutputFormat, RenderOptions, Renderer, ResultSet, SelectionState, ViewOptions,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "querydash")]
#[command(about = "Compute dashboard charts and tables from query results on stdin", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one view (table, bar, line, pie, scatterPlot, heatMap)
    Render {
        kind: ChartKind,
        /// X axis field, or "all" to use the row position
        #[arg(long)]
        x: Option<String>,
        /// Y axis field, or "all" for every numeric field
        #[arg(long)]
        y: Option<String>,
        /// Case-insensitive substring filter on the X field
        #[arg(long, default_value = "")]
        filter: String,
        /// 1-based table page
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Heat-map container width in pixels
        #[arg(long)]
        container_width: Option<f64>,
        /// Heat-map container height in pixels
        #[arg(long)]
        container_height: Option<f64>,
        /// Heat-map title band height in pixels
        #[arg(long)]
        title_height: Option<f64>,
        #[arg(long, value_enum, default_value = "json")]
        input: InputFormat,
        /// Dashboard settings file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit a PNG preview instead of JSON
        #[arg(long)]
        png: bool,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
    /// Print the categorical and numeric fields of the result set
    Fields {
        #[arg(long, value_enum, default_value = "json")]
        input: InputFormat,
    },
    /// Manage the per-role query history file
    History {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "user")]
        role: Role,
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    List,
    Add { query: String },
    Remove { index: usize },
}

fn read_result_set(format: InputFormat) -> Result<ResultSet> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read result set from stdin")?;
    match format {
        InputFormat::Json => ResultSet::from_json_str(&input),
        InputFormat::Csv => ResultSet::from_csv_reader(input.as_bytes()),
    }
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(bytes).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn main() -> Result<()> {
    let _ = querydash::telemetry::init_tracing();
    let args = Args::parse();

    match args.command {
        Command::Render {
            kind,
            x,
            y,
            filter,
            page,
            container_width,
            container_height,
            title_height,
            input,
            config,
            png,
            width,
            height,
        } => {
            let config = match config {
                Some(path) => DashboardConfig::from_path(path)?,
                None => DashboardConfig::default(),
            };
            let data = read_result_set(input)?;

            let mut state = SelectionState::new(&data);
            if let Some(x) = x {
                state.select_x(AxisChoice::parse(&x));
            }
            if let Some(y) = y {
                state.select_y(AxisChoice::parse(&y));
            }
            state.set_filter(filter);

            let container = container_width.zip(container_height).map(|(w, h)| {
                let size = ContainerSize::new(w, h);
                match title_height {
                    Some(t) => size.with_title_height(t),
                    None => size,
                }
            });
            let options = ViewOptions { page, container };

            let renderer = Renderer::new(config);
            let output = render_view(kind, &state, &data, &options, &renderer.context());

            let render_options = RenderOptions {
                width: width.unwrap_or(renderer.config.canvas.width),
                height: height.unwrap_or(renderer.config.canvas.height),
                format: if png { OutputFormat::Png } else { OutputFormat::Json },
            };
            let bytes = encode_output(&output, &render_options).context("Failed to encode output")?;
            write_stdout(&bytes)
        }
        Command::Fields { input } => {
            let data = read_result_set(input)?;
            let classification = querydash::classify(&data);
            let mut bytes = serde_json::to_vec_pretty(&classification)
                .context("Failed to serialize field classification")?;
            bytes.push(b'\n');
            write_stdout(&bytes)
        }
        Command::History { file, role, action } => {
            let mut store = JsonFileHistory::new(file);
            let text = match action {
                HistoryAction::List => store
                    .load(role)?
                    .iter()
                    .enumerate()
                    .map(|(i, q)| format!("{}\t{}\n", i, q))
                    .collect::<String>(),
                HistoryAction::Add { query } => {
                    if !store.append(role, &query)? {
                        eprintln!("Warning: ignoring blank query");
                    }
                    String::new()
                }
                HistoryAction::Remove { index } => {
                    if !store.remove(role, index)? {
                        eprintln!("Warning: no history entry at index {}", index);
                    }
                    String::new()
                }
            };
            write_stdout(text.as_bytes())
        }
    }
}
