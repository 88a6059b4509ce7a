//! Technical indicators computed over a price column.
//!
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: one optional value per input row; `None` during
//!   warmup
//! - `add_technical_indicators`: appends the default indicator set to a
//!   table and drops rows where any indicator is still warming up

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use std::fmt;

use tracing::{info, warn};

use crate::domain::error::SigtraderError;
use crate::domain::table::FeatureTable;

pub const SMA_FAST_COLUMN: &str = "sma_20";
pub const SMA_SLOW_COLUMN: &str = "sma_50";
pub const RSI_COLUMN: &str = "rsi";
pub const MACD_COLUMN: &str = "macd";
pub const SIGNAL_LINE_COLUMN: &str = "signal_line";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// Values as a table column: warmup rows become `NaN`.
    pub fn to_column(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Append `sma_20`, `sma_50`, `rsi`, `macd` and `signal_line` computed from
/// `price_column`, then drop rows with any undefined value.
pub fn add_technical_indicators(
    table: &mut FeatureTable,
    price_column: &str,
) -> Result<(), SigtraderError> {
    let prices = table.require_column(price_column)?.to_vec();

    let sma_fast = calculate_sma(&prices, 20);
    let sma_slow = calculate_sma(&prices, 50);
    let rsi = calculate_rsi(&prices, rsi::DEFAULT_PERIOD);
    let macd = calculate_macd(
        &prices,
        macd::DEFAULT_FAST,
        macd::DEFAULT_SLOW,
        macd::DEFAULT_SIGNAL,
    );

    table.insert_column(SMA_FAST_COLUMN, sma_fast.to_column())?;
    table.insert_column(SMA_SLOW_COLUMN, sma_slow.to_column())?;
    table.insert_column(RSI_COLUMN, rsi.to_column())?;
    table.insert_column(MACD_COLUMN, macd.line.to_column())?;
    table.insert_column(SIGNAL_LINE_COLUMN, macd.signal.to_column())?;

    let dropped = table.drop_incomplete_rows();
    if dropped > 0 {
        warn!(dropped, "dropped indicator warmup rows");
    }
    info!(
        dropped,
        remaining = table.len(),
        "added technical indicators"
    );
    Ok(())
}
