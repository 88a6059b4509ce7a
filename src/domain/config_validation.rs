//! Configuration validation.
//!
//! Validates every config section before the pipeline runs. The first
//! offending key is reported.

use crate::domain::error::SigtraderError;
use crate::domain::model::{DEFAULT_SEED, DEFAULT_TEST_SIZE, ForestParams};
use crate::domain::normalize::NormalizeMethod;
use crate::domain::simulation::SimulationParams;
use crate::ports::config_port::ConfigPort;

/// Validate everything `run` needs.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_data_config(config)?;
    validate_backtest_config(config)?;
    validate_pipeline_config(config)?;
    validate_model_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("data", "hourly_file") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(SigtraderError::ConfigMissing {
                section: "data".to_string(),
                key: "hourly_file".to_string(),
            })
        }
    }
    if let Some(s) = config.get_string("data", "price_column") {
        if s.trim().is_empty() {
            return Err(invalid("data", "price_column", "price_column must not be empty"));
        }
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let defaults = SimulationParams::default();

    let capital = config.get_double("backtest", "initial_capital", defaults.initial_capital);
    if capital <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let risk = config.get_double("backtest", "risk_per_trade", defaults.risk_per_trade);
    if risk <= 0.0 || risk > 1.0 {
        return Err(invalid(
            "backtest",
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }

    let target = config.get_double("backtest", "profit_target", defaults.profit_target);
    if target <= 0.0 {
        return Err(invalid(
            "backtest",
            "profit_target",
            "profit_target must be positive",
        ));
    }

    let stop = config.get_double("backtest", "stop_loss", defaults.stop_loss);
    if stop <= 0.0 {
        return Err(invalid("backtest", "stop_loss", "stop_loss must be positive"));
    }
    Ok(())
}

pub fn validate_pipeline_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    normalize_method(config).map(|_| ())
}

/// `[pipeline] normalize`, with `none` meaning no scaling.
pub fn normalize_method(config: &dyn ConfigPort) -> Result<Option<NormalizeMethod>, SigtraderError> {
    match config.get_string("pipeline", "normalize") {
        None => Ok(Some(NormalizeMethod::MinMax)),
        Some(s) if s.trim().eq_ignore_ascii_case("none") => Ok(None),
        Some(s) => s.parse::<NormalizeMethod>().map(Some).map_err(|_| {
            invalid(
                "pipeline",
                "normalize",
                "normalize must be one of minmax, zscore, none",
            )
        }),
    }
}

pub fn validate_model_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let defaults = ForestParams::default();

    if config.get_int("model", "n_trees", defaults.n_trees as i64) < 1 {
        return Err(invalid("model", "n_trees", "n_trees must be at least 1"));
    }
    if config.get_int("model", "max_depth", defaults.max_depth as i64) < 1 {
        return Err(invalid("model", "max_depth", "max_depth must be at least 1"));
    }
    if config.get_int("model", "min_samples_split", defaults.min_samples_split as i64) < 2 {
        return Err(invalid(
            "model",
            "min_samples_split",
            "min_samples_split must be at least 2",
        ));
    }
    let test_size = config.get_double("model", "test_size", DEFAULT_TEST_SIZE);
    if test_size <= 0.0 || test_size >= 1.0 {
        return Err(invalid("model", "test_size", "test_size must be between 0 and 1"));
    }
    if config.get_int("model", "seed", DEFAULT_SEED as i64) < 0 {
        return Err(invalid("model", "seed", "seed must be non-negative"));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
