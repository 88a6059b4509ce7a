//! Binary buy label derived from trend and momentum indicators.

use super::error::SigtraderError;
use super::indicator::{MACD_COLUMN, SIGNAL_LINE_COLUMN, SMA_FAST_COLUMN, SMA_SLOW_COLUMN};
use super::table::{FeatureTable, TARGET_COLUMN};

/// `target = 1` where `sma_20 > sma_50` and `macd > signal_line`, else 0.
pub fn add_target(table: &mut FeatureTable) -> Result<(), SigtraderError> {
    let fast = table.require_column(SMA_FAST_COLUMN)?;
    let slow = table.require_column(SMA_SLOW_COLUMN)?;
    let macd = table.require_column(MACD_COLUMN)?;
    let signal = table.require_column(SIGNAL_LINE_COLUMN)?;

    let target: Vec<f64> = (0..table.len())
        .map(|i| {
            if fast[i] > slow[i] && macd[i] > signal[i] {
                1.0
            } else {
                0.0
            }
        })
        .collect();

    table.insert_column(TARGET_COLUMN, target)
}
