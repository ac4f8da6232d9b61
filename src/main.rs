//! Command line entry point for EGT Margin forecasting
//!
//! Usage:
//! ```text
//! egt-forecast inspect data/engine.xlsx
//! egt-forecast forecast data/engine.xlsx --csv predictions.csv --xlsx forecast.xlsx
//! cat engine.csv | egt-forecast forecast - --format csv --json
//! egt-forecast init-config forecast.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use egt_forecast::{
    config::ForecastConfig,
    data::{DataLoader, InputFormat, ObservationSeries, StagedInput},
    error::ForecastError,
    forecast::Forecaster,
    report::{self, ChartSize},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Forecast EGT Margin with lag features and gradient boosting")]
struct Cli {
    /// TOML configuration file (defaults are used for missing keys)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the first rows and a chart of the raw measurements
    Inspect {
        #[command(flatten)]
        input: InputArgs,

        /// Number of rows to print
        #[arg(long, default_value = "5")]
        rows: usize,
    },

    /// Train, evaluate, and forecast future cycles
    Forecast {
        #[command(flatten)]
        input: InputArgs,

        /// Number of cycles to forecast
        #[arg(short = 'H', long)]
        horizon: Option<usize>,

        /// First forecast CSN when the input has no CSN column
        #[arg(long)]
        fallback_csn: Option<i64>,

        /// Write the forecast table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the forecast, chart, and metrics to an .xlsx workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Print the metrics as JSON instead of the full report
        #[arg(long)]
        json: bool,

        /// Number of forecast rows to print
        #[arg(long, default_value = "20")]
        rows: usize,
    },

    /// Write the default configuration to a TOML file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Input table (.csv, .xlsx, .xls, .ods) or "-" for stdin
    input: PathBuf,

    /// Input format; required for stdin, otherwise taken from the extension
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for InputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => InputFormat::Csv,
            FormatArg::Xlsx => InputFormat::Workbook,
        }
    }
}

/// Where the input table comes from
///
/// A staged stream owns its temporary file; dropping the source removes it.
enum Source {
    File { path: PathBuf, format: InputFormat },
    Staged(StagedInput),
}

impl Source {
    fn open(args: &InputArgs) -> Result<Self> {
        if args.input == Path::new("-") {
            let format = args.format.map(InputFormat::from).unwrap_or(InputFormat::Csv);
            let staged = StagedInput::stage(std::io::stdin().lock(), format)
                .context("Failed to stage stdin")?;
            return Ok(Source::Staged(staged));
        }

        let format = match args.format {
            Some(f) => f.into(),
            None => InputFormat::from_path(&args.input)?,
        };
        Ok(Source::File {
            path: args.input.clone(),
            format,
        })
    }

    fn load(&self, config: &ForecastConfig) -> Result<ObservationSeries> {
        let series = match self {
            Source::File { path, format } => DataLoader::load_series_as(path, *format, config)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            Source::Staged(staged) => staged
                .load_series(config)
                .context("Failed to load table from stdin")?,
        };
        Ok(series)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("egt_forecast=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (label, code) = match err.downcast_ref::<ForecastError>() {
                Some(ForecastError::MalformedInput(_)) => ("Malformed input", 2),
                Some(ForecastError::DegenerateSplit { .. }) => ("Not enough data", 3),
                Some(ForecastError::Config(_)) => ("Configuration error", 4),
                _ => ("Error", 1),
            };
            eprintln!("{} {:#}", format!("{}:", label).red().bold(), err);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ForecastConfig::from_toml(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ForecastConfig::default(),
    };

    match cli.command {
        Command::InitConfig { path } => {
            config.save_toml(&path)?;
            println!("Wrote configuration to {}", path.display());
            Ok(())
        }
        Command::Inspect { input, rows } => {
            let source = Source::open(&input)?;
            let series = source.load(&config)?;
            show_raw(&series, &config, rows);
            Ok(())
        }
        Command::Forecast {
            input,
            horizon,
            fallback_csn,
            csv,
            xlsx,
            json,
            rows,
        } => {
            if let Some(h) = horizon {
                config.horizon = h;
            }
            if let Some(start) = fallback_csn {
                config.fallback_start_csn = start;
            }
            let forecaster = Forecaster::with_config(config)?;
            let config = forecaster.config();

            let source = Source::open(&input)?;
            let series = source.load(config)?;

            if !json {
                show_raw(&series, config, 5);
                println!("\nTraining model and forecasting {} cycles...", config.horizon);
            }

            let outcome = forecaster.run(&series)?;
            let zone = &config.critical_zone;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.metrics)?);
            } else {
                report::print_metrics(&outcome.metrics);
                println!(
                    "({} training rows, {} test rows)",
                    outcome.train_rows, outcome.test_rows
                );

                let xs: Vec<f64> = outcome.table.cycles().iter().map(|&c| c as f64).collect();
                let chart = report::render_chart(
                    &format!("EGT Margin Forecast - Critical Zone [{} - {}]", zone.lower, zone.upper),
                    &xs,
                    &outcome.table.predictions(),
                    zone,
                    ChartSize::default(),
                );
                println!("\n{}", chart);

                report::print_forecast_table(&outcome.table, zone, rows);
                report::print_zone_summary(&outcome.table, zone);
            }

            if let Some(path) = csv {
                report::save_forecast_csv(&outcome.table, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            if let Some(path) = xlsx {
                report::save_workbook(&outcome.table, &outcome.metrics, zone, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            info!("Done");
            Ok(())
        }
    }
}

fn show_raw(series: &ObservationSeries, config: &ForecastConfig, rows: usize) {
    println!("{}", "Raw data".bold().blue());
    report::print_series_head(series, rows);

    let axis_name = if series.has_cycles() {
        config.cycle_column.as_str()
    } else {
        "row"
    };
    let chart = report::render_chart(
        &format!("{} by {}", config.measurement_column, axis_name),
        &series.axis(),
        series.values(),
        &config.critical_zone,
        ChartSize::default(),
    );
    println!("\n{}", chart);
}
