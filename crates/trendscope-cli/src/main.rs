//! trendscope — Patent and paper trend dashboard.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trendscope_cli::render::{self, count_rows, mapping_rows};
use trendscope_cli::{CountQuery, Dashboard, DifficultyQuery, DifficultyRows};
use trendscope_common::{DashboardConfig, Domain, OutputFormat, View};
use trendscope_ingestion::{normalize, ExpectedShape, Measure, Overlay, RawTable};
use trendscope_ranker::{Dimension, Metric};

#[derive(Parser, Debug)]
#[command(name = "trendscope")]
#[command(about = "Patent and paper trends by technical element, with difficulty scoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "TRENDSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the data directory from the configuration
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count series over time
    Counts {
        #[arg(long, default_value = "patent")]
        domain: Domain,

        #[arg(long, default_value = "monthly")]
        view: View,

        /// Technical element to drill into
        #[arg(short, long)]
        element: Option<String>,

        /// Show running totals instead of per-period counts
        #[arg(long)]
        cumulative: bool,

        /// Hide the raw count line
        #[arg(long)]
        no_raw: bool,

        /// Hide the moving-average overlay
        #[arg(long)]
        no_moving_average: bool,

        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Technical difficulty by industry or company
    Difficulty {
        #[arg(long, default_value = "composite")]
        metric: Metric,

        #[arg(long, default_value = "industry")]
        dimension: Dimension,

        /// Technical elements to include (repeatable); all when omitted
        #[arg(short, long = "element")]
        elements: Vec<String>,

        /// Rank groups by composite score for one element
        #[arg(long)]
        bar_element: Option<String>,

        /// Print the score table with evidence
        #[arg(long)]
        scores: bool,

        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Show how a file's columns map onto the canonical schema
    Inspect {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "grouped")]
        shape: ShapeArg,

        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Read commands from stdin, keeping loaded tables between them
    Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShapeArg {
    Monthly,
    Grouped,
}

impl From<ShapeArg> for ExpectedShape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Monthly => ExpectedShape::Monthly,
            ShapeArg::Grouped => ExpectedShape::Grouped,
        }
    }
}

fn load_config(cli: &Cli) -> DashboardConfig {
    let loaded = match &cli.config {
        Some(path) => DashboardConfig::load_from(path),
        None => DashboardConfig::load(),
    };
    let mut config = match loaded {
        Ok(c) => {
            info!("Configuration loaded. Data root: {}", c.data.root.display());
            c
        }
        Err(e) => {
            warn!("Could not load configuration: {e}");
            warn!("Falling back to defaults.");
            DashboardConfig::default()
        }
    };
    if let Some(root) = &cli.data_root {
        config.data.root = root.clone();
    }
    config
}

fn run(dashboard: &mut Dashboard, command: Commands, out: &mut impl Write) -> anyhow::Result<()> {
    let display = dashboard.config().display.clone();

    match command {
        Commands::Counts { domain, view, element, cumulative, no_raw, no_moving_average, format } => {
            let query = CountQuery {
                domain,
                view,
                element,
                measure: if cumulative { Measure::Cumulative } else { Measure::Count },
                overlay: Overlay {
                    show_raw: display.show_raw && !no_raw,
                    show_moving_average: display.show_moving_average && !no_moving_average,
                },
            };
            let path = dashboard.config().data.path_for(domain, view);
            let series = dashboard
                .count_series(&query)
                .with_context(|| format!("loading {} {} counts from {}", domain, view, path.display()))?;
            let rows = count_rows(&series, query.measure, query.overlay);
            render::write_rows(out, &rows, format.unwrap_or(display.format))?;
        }

        Commands::Difficulty { metric, dimension, elements, bar_element, scores, format } => {
            let query = DifficultyQuery {
                metric,
                dimension,
                elements,
                bar_element,
                score_table: scores,
            };
            let path = dashboard.config().data.difficulty_path();
            let rows = dashboard
                .difficulty_rows(&query)
                .with_context(|| format!("scoring difficulty from {}", path.display()))?;
            let format = format.unwrap_or(display.format);
            match rows {
                DifficultyRows::Radar(rows) => render::write_rows(out, &rows, format)?,
                DifficultyRows::Bar(rows) => render::write_rows(out, &rows, format)?,
                DifficultyRows::Scores(rows) => render::write_rows(out, &rows, format)?,
            }
        }

        Commands::Inspect { file, shape, format } => {
            let raw = RawTable::from_path(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let table = normalize(&raw, shape.into())
                .with_context(|| format!("normalising {}", file.display()))?;
            let undated = table.records.iter().filter(|r| r.timestamp.is_none()).count();
            info!(rows = table.len(), undated, "Inspected {}", file.display());
            render::write_rows(out, &mapping_rows(&table.mapping), format.unwrap_or(display.format))?;
        }

        Commands::Shell => shell(dashboard, io::stdin().lock(), out)?,
    }

    Ok(())
}

/// Each input line is one subcommand. `:reload` drops cached tables and
/// `:quit` ends the session; errors are reported and the loop continues.
fn shell(dashboard: &mut Dashboard, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" | "exit" => break,
            ":reload" => {
                dashboard.reload();
                continue;
            }
            _ => {}
        }

        let args = std::iter::once("trendscope").chain(line.split_whitespace());
        let command = match Cli::try_parse_from(args) {
            Ok(Cli { command: Commands::Shell, .. }) => {
                warn!("Already in a shell");
                continue;
            }
            Ok(cli) => cli.command,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        if let Err(e) = run(dashboard, command, &mut *out) {
            writeln!(out, "error: {e:#}")?;
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so that stdout carries only rendered rows.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trendscope=info,warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli);
    let mut dashboard = Dashboard::new(config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&mut dashboard, cli.command, &mut out)
}
