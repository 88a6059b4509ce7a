//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};

use crate::adapters::csv_adapter::{read_table, write_table, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_report_adapter::FileReportAdapter;
use crate::domain::config_validation::{normalize_method, validate_config};
use crate::domain::error::SigtraderError;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::model::{Classifier, ForestParams, DEFAULT_SEED, DEFAULT_TEST_SIZE};
use crate::domain::pipeline::{
    prepare_dataset, train_and_simulate, PipelineConfig, PipelineResult, DEFAULT_PRICE_COLUMN,
};
use crate::domain::simulation::{simulate_trading, SimulationParams};
use crate::domain::verifier::verify_dataset;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Signal-driven trade simulator")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline: load, indicators, train, evaluate, simulate, report
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Report directory; overrides [output] report_dir
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Simulate trading on a CSV that already has a `predicted` column
    Simulate {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_PRICE_COLUMN)]
        price_column: String,
        #[arg(long)]
        initial_capital: Option<f64>,
        #[arg(long)]
        risk_per_trade: Option<f64>,
        #[arg(long)]
        profit_target: Option<f64>,
        #[arg(long)]
        stop_loss: Option<f64>,
        /// Report directory for the annotated series, metrics and chart
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a summary of a feature CSV: shape, missing values, column kinds
    Verify {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);
    match cli.command {
        Command::Run { config, output_dir } => run_full(&config, output_dir.as_deref()),
        Command::Simulate {
            input,
            price_column,
            initial_capital,
            risk_per_trade,
            profit_target,
            stop_loss,
            output,
        } => {
            let defaults = SimulationParams::default();
            let params = SimulationParams {
                initial_capital: initial_capital.unwrap_or(defaults.initial_capital),
                risk_per_trade: risk_per_trade.unwrap_or(defaults.risk_per_trade),
                profit_target: profit_target.unwrap_or(defaults.profit_target),
                stop_loss: stop_loss.unwrap_or(defaults.stop_loss),
            };
            run_simulate(&input, &price_column, &params, output.as_deref())
        }
        Command::Verify { input } => run_verify(&input),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Install the stderr fmt subscriber. Repeated calls are no-ops.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn fail(err: SigtraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn config_usize(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SigtraderError> {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| SigtraderError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: format!("{} must be non-negative", key),
    })
}

pub fn build_simulation_params(adapter: &dyn ConfigPort) -> SimulationParams {
    let defaults = SimulationParams::default();
    SimulationParams {
        initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
        risk_per_trade: adapter.get_double("backtest", "risk_per_trade", defaults.risk_per_trade),
        profit_target: adapter.get_double("backtest", "profit_target", defaults.profit_target),
        stop_loss: adapter.get_double("backtest", "stop_loss", defaults.stop_loss),
    }
}

pub fn build_pipeline_config(adapter: &dyn ConfigPort) -> Result<PipelineConfig, SigtraderError> {
    let forest_defaults = ForestParams::default();
    let seed = adapter.get_int("model", "seed", DEFAULT_SEED as i64);

    Ok(PipelineConfig {
        price_column: adapter
            .get_string("data", "price_column")
            .unwrap_or_else(|| DEFAULT_PRICE_COLUMN.to_string()),
        normalize: normalize_method(adapter)?,
        forest: ForestParams {
            n_trees: config_usize(adapter, "model", "n_trees", forest_defaults.n_trees)?,
            max_depth: config_usize(adapter, "model", "max_depth", forest_defaults.max_depth)?,
            min_samples_split: config_usize(
                adapter,
                "model",
                "min_samples_split",
                forest_defaults.min_samples_split,
            )?,
            seed: u64::try_from(seed).map_err(|_| SigtraderError::ConfigInvalid {
                section: "model".into(),
                key: "seed".into(),
                reason: "seed must be non-negative".into(),
            })?,
        },
        test_size: adapter.get_double("model", "test_size", DEFAULT_TEST_SIZE),
        simulation: build_simulation_params(adapter),
    })
}

/// Build the CSV data adapter from `[data]`.
pub fn build_data_adapter(adapter: &dyn ConfigPort) -> Result<CsvAdapter, SigtraderError> {
    let hourly = adapter
        .get_string("data", "hourly_file")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "data".into(),
            key: "hourly_file".into(),
        })?;
    let daily = adapter
        .get_string("data", "daily_file")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    Ok(CsvAdapter::new(PathBuf::from(hourly), daily))
}

/// Pipeline stages after configuration: prepare, optionally persist the
/// processed dataset, train, evaluate, simulate, optionally report.
pub fn run_pipeline_stages(
    data: &dyn DataPort,
    config: &PipelineConfig,
    processed_file: Option<&Path>,
    report: Option<&dyn ReportPort>,
) -> Result<PipelineResult, SigtraderError> {
    config.simulation.validate()?;

    let table = prepare_dataset(data, config)?;
    if let Some(path) = processed_file {
        write_table(path, &table)?;
        info!(path = %path.display(), rows = table.len(), "saved processed dataset");
    }

    let result = train_and_simulate(&table, config)?;

    if let Some(report) = report {
        report.write_simulation(&result.series, &result.metrics)?;
        report.write_confusion_matrix(&result.evaluation)?;
        if let Some(importances) = result.model.feature_importances() {
            report.write_feature_importance(result.model.feature_names(), importances)?;
        }
    }
    Ok(result)
}

fn run_full(config_path: &Path, output_dir: Option<&Path>) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) = validate_config(&adapter) {
        return fail(e);
    }

    // Stage 3: Build pipeline config and adapters
    let config = match build_pipeline_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let data = match build_data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let processed_file = adapter.get_string("output", "processed_file").map(PathBuf::from);
    let report_dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("output", "report_dir").map(PathBuf::from));
    let report = report_dir.map(FileReportAdapter::new);

    // Stage 4: Pipeline
    eprintln!("Running pipeline on {}", config.price_column);
    let result = match run_pipeline_stages(
        &data,
        &config,
        processed_file.as_deref(),
        report.as_ref().map(|r| r as &dyn ReportPort),
    ) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    // Stage 5: Summary
    println!("{}", result.verification);
    println!("{}", result.evaluation);
    println!();
    print_metrics(&result.metrics);
    if let Some(report) = &report {
        eprintln!("Report written to {}", report.dir().display());
    }
    ExitCode::SUCCESS
}

fn run_simulate(
    input: &Path,
    price_column: &str,
    params: &SimulationParams,
    output: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading {}", input.display());
    let table = match read_table(input) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    let (metrics, series) = match simulate_trading(&table, price_column, None, params) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    print_metrics(&metrics);

    if let Some(dir) = output {
        let report = FileReportAdapter::new(dir);
        if let Err(e) = report.write_simulation(&series, &metrics) {
            return fail(e);
        }
        eprintln!("Report written to {}", dir.display());
    }
    ExitCode::SUCCESS
}

fn run_verify(input: &Path) -> ExitCode {
    let table = match read_table(input) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };
    print!("{}", verify_dataset(&table, None));
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&adapter) {
        return fail(e);
    }
    let config = match build_pipeline_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nData:");
    eprintln!(
        "  hourly_file:     {}",
        adapter.get_string("data", "hourly_file").unwrap_or_default()
    );
    eprintln!(
        "  daily_file:      {}",
        adapter
            .get_string("data", "daily_file")
            .unwrap_or_else(|| "(none)".into())
    );
    eprintln!("  price_column:    {}", config.price_column);
    eprintln!("\nBacktest:");
    eprintln!("  initial_capital: {}", config.simulation.initial_capital);
    eprintln!("  risk_per_trade:  {}", config.simulation.risk_per_trade);
    eprintln!("  profit_target:   {}", config.simulation.profit_target);
    eprintln!("  stop_loss:       {}", config.simulation.stop_loss);
    eprintln!("\nModel:");
    eprintln!(
        "  random forest:   {} trees, max depth {}, seed {}",
        config.forest.n_trees, config.forest.max_depth, config.forest.seed
    );
    eprintln!(
        "  normalize:       {}",
        config
            .normalize
            .map_or_else(|| "none".to_string(), |m| m.to_string())
    );
    eprintln!("\nConfig OK");
    ExitCode::SUCCESS
}

pub fn print_metrics(metrics: &PerformanceMetrics) {
    println!("Total Profit:  {:.2}", metrics.total_profit);
    println!("Win Rate:      {:.2}%", metrics.win_rate * 100.0);
    println!("Sharpe Ratio:  {:.4}", metrics.sharpe_ratio);
    println!("Final Balance: {:.2}", metrics.final_balance);
    println!("Total Trades:  {}", metrics.total_trades);
}
