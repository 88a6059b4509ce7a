//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Default parameters: fast=12, slow=26, signal=9. With first-value-seeded
//! EMAs both lines are defined from the first bar.

use super::ema::ema_values;
use super::{IndicatorSeries, IndicatorType};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
}

impl MacdSeries {
    pub fn histogram(&self) -> Vec<Option<f64>> {
        self.line
            .values
            .iter()
            .zip(&self.signal.values)
            .map(|(l, s)| Some((*l)? - (*s)?))
            .collect()
    }
}

pub fn calculate_macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let indicator_type = IndicatorType::Macd { fast, slow, signal };
    if fast == 0 || slow == 0 || signal == 0 {
        return MacdSeries {
            line: IndicatorSeries::empty(indicator_type),
            signal: IndicatorSeries::empty(indicator_type),
        };
    }

    let line: Vec<f64> = ema_values(prices, fast)
        .iter()
        .zip(ema_values(prices, slow))
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&line, signal);

    MacdSeries {
        line: IndicatorSeries {
            indicator_type,
            values: line.into_iter().map(Some).collect(),
        },
        signal: IndicatorSeries {
            indicator_type,
            values: signal_line.into_iter().map(Some).collect(),
        },
    }
}
