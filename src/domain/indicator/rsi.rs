//! RSI (Relative Strength Index) over simple rolling means.
//!
//! gain/loss = rolling mean over n price changes of the positive/negative
//! part of each change. RSI = 100 - 100 / (1 + gain / loss).
//! loss == 0: RSI = 100 when gain > 0, 50 when the window is flat.
//!
//! Warmup: first n values undefined (n changes need n+1 prices).

use super::{IndicatorSeries, IndicatorType};

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(prices: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Rsi(period));
    }

    let mut values = vec![None; prices.len()];
    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

    for end in period..=changes.len() {
        let window = &changes[end - period..end];
        let gain = window.iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
        let loss = window.iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;
        values[end] = Some(rsi_from(gain, loss));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from(gain: f64, loss: f64) -> f64 {
    if loss == 0.0 {
        if gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - 100.0 / (1.0 + gain / loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_warmup() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&prices, 14);
        for i in 0..14 {
            assert!(series.values[i].is_none(), "index {} should be undefined", i);
        }
        assert!(series.values[14].is_some());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let prices: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&prices, 3);
        assert_relative_eq!(series.last().unwrap(), 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let prices: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&prices, 3);
        assert_relative_eq!(series.last().unwrap(), 0.0);
    }

    #[test]
    fn rsi_flat_window_is_neutral() {
        let series = calculate_rsi(&[100.0; 6], 3);
        assert_relative_eq!(series.last().unwrap(), 50.0);
    }

    #[test]
    fn rsi_known_value() {
        // changes: +2, -1, +2 → gain = 4/3, loss = 1/3, rs = 4 → rsi = 80
        let series = calculate_rsi(&[100.0, 102.0, 101.0, 103.0], 3);
        assert_relative_eq!(series.values[3].unwrap(), 80.0, epsilon = 1e-9);
    }

    #[test]
    fn rsi_short_series_all_undefined() {
        let series = calculate_rsi(&[1.0, 2.0], 14);
        assert_eq!(series.values, vec![None, None]);
    }
}
