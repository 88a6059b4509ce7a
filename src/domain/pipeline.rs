//! End-to-end run: load, engineer features, train, evaluate, simulate.

use tracing::info;

use super::error::SigtraderError;
use super::indicator::add_technical_indicators;
use super::metrics::PerformanceMetrics;
use super::model::{
    evaluate_model, prepare_features_and_target, train_test_split, Classifier, ForestParams,
    ModelEvaluation, RandomForest, DEFAULT_TEST_SIZE,
};
use super::normalize::{normalize, NormalizeMethod};
use super::simulation::{simulate_trading, AnnotatedSeries, SimulationParams};
use super::table::{FeatureTable, TARGET_COLUMN};
use super::target::add_target;
use super::timeframe::merge_timeframes;
use super::verifier::{verify_dataset, VerificationReport};
use crate::ports::data_port::DataPort;

pub const DEFAULT_PRICE_COLUMN: &str = "Close_1h";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub price_column: String,
    /// `None` leaves features unscaled.
    pub normalize: Option<NormalizeMethod>,
    pub forest: ForestParams,
    pub test_size: f64,
    pub simulation: SimulationParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            price_column: DEFAULT_PRICE_COLUMN.to_string(),
            normalize: Some(NormalizeMethod::MinMax),
            forest: ForestParams::default(),
            test_size: DEFAULT_TEST_SIZE,
            simulation: SimulationParams::default(),
        }
    }
}

#[derive(Debug)]
pub struct PipelineResult {
    pub verification: VerificationReport,
    pub model: RandomForest,
    pub evaluation: ModelEvaluation,
    pub metrics: PerformanceMetrics,
    pub series: AnnotatedSeries,
}

/// Load both timeframes, merge them, add indicators and the target label,
/// then scale every feature except the price and target columns.
pub fn prepare_dataset(
    data: &dyn DataPort,
    config: &PipelineConfig,
) -> Result<FeatureTable, SigtraderError> {
    let hourly = data.load_hourly()?;
    let daily = data.load_daily()?;
    info!(
        hourly_rows = hourly.len(),
        daily_rows = daily.as_ref().map_or(0, |d| d.len()),
        "loaded price data"
    );

    let mut table = merge_timeframes(&hourly, daily.as_ref())?;
    non_empty(&table, "merging timeframes")?;

    add_technical_indicators(&mut table, &config.price_column)?;
    non_empty(&table, "adding technical indicators")?;

    add_target(&mut table)?;

    if let Some(method) = config.normalize {
        let columns: Vec<String> = table.feature_names(&[&config.price_column, TARGET_COLUMN]);
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        normalize(&mut table, method, Some(&columns))?;
        info!(%method, columns = columns.len(), "normalized features");
    }
    Ok(table)
}

/// Train a forest on `table` and simulate trading on its predictions for
/// every row.
pub fn train_and_simulate(
    table: &FeatureTable,
    config: &PipelineConfig,
) -> Result<PipelineResult, SigtraderError> {
    let verification = verify_dataset(table, None);
    info!(
        rows = verification.rows,
        columns = verification.columns,
        missing = verification.missing.total_missing,
        "verified dataset"
    );

    let (x, y) = prepare_features_and_target(table, TARGET_COLUMN)?;
    let split = train_test_split(&x, &y, config.test_size, config.forest.seed)?;
    info!(
        train = split.x_train.len(),
        test = split.x_test.len(),
        features = x.n_features(),
        "split dataset"
    );

    let model = RandomForest::fit(&split.x_train, &split.y_train, &config.forest)?;
    info!(trees = model.n_trees(), "trained random forest");

    let evaluation = evaluate_model(&model, &split.x_test, &split.y_test)?;
    info!(accuracy = evaluation.accuracy, "evaluated model");

    let (metrics, series) = simulate_trading(
        table,
        &config.price_column,
        Some(&model as &dyn Classifier),
        &config.simulation,
    )?;
    info!(
        trades = metrics.total_trades,
        total_profit = metrics.total_profit,
        final_balance = metrics.final_balance,
        "simulated trading"
    );

    Ok(PipelineResult {
        verification,
        model,
        evaluation,
        metrics,
        series,
    })
}

pub fn run_pipeline(
    data: &dyn DataPort,
    config: &PipelineConfig,
) -> Result<(FeatureTable, PipelineResult), SigtraderError> {
    config.simulation.validate()?;
    let table = prepare_dataset(data, config)?;
    let result = train_and_simulate(&table, config)?;
    Ok((table, result))
}

fn non_empty(table: &FeatureTable, stage: &str) -> Result<(), SigtraderError> {
    if table.is_empty() {
        return Err(SigtraderError::EmptyDataset {
            stage: stage.to_string(),
        });
    }
    Ok(())
}
