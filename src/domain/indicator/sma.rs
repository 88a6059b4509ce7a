//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) values undefined.

use super::{IndicatorSeries, IndicatorType};

pub fn calculate_sma(prices: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let mut values = Vec::with_capacity(prices.len());
    let mut sum = 0.0;

    for (i, &price) in prices.iter().enumerate() {
        sum += price;
        if i >= period {
            sum -= prices[i - period];
        }
        values.push(if i + 1 >= period {
            Some(sum / period as f64)
        } else {
            None
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert_eq!(series.values[0], None);
        assert_eq!(series.values[1], None);
        assert!(series.values[2].is_some());
    }

    #[test]
    fn sma_rolling_values() {
        let series = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_relative_eq!(series.values[2].unwrap(), 20.0);
        assert_relative_eq!(series.values[3].unwrap(), 30.0);
        assert_relative_eq!(series.values[4].unwrap(), 40.0);
    }

    #[test]
    fn sma_period_longer_than_series() {
        let series = calculate_sma(&[1.0, 2.0], 5);
        assert!(series.values.iter().all(|v| v.is_none()));
    }

    #[test]
    fn sma_period_0() {
        assert!(calculate_sma(&[1.0, 2.0], 0).values.is_empty());
    }

    #[test]
    fn sma_indicator_type() {
        assert_eq!(calculate_sma(&[1.0], 20).indicator_type, IndicatorType::Sma(20));
    }
}
