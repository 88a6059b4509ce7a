//! Exponential Moving Average (recursive form, no bias adjustment).
//!
//! alpha = 2/(span+1), EMA[0] = C[0], EMA[i] = alpha*C[i] + (1-alpha)*EMA[i-1].
//! Defined from the first value onward.

use super::{IndicatorSeries, IndicatorType};

pub fn calculate_ema(prices: &[f64], span: usize) -> IndicatorSeries {
    if span == 0 {
        return IndicatorSeries::empty(IndicatorType::Ema(span));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values: ema_values(prices, span).into_iter().map(Some).collect(),
    }
}

pub(crate) fn ema_values(prices: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(prices.len());
    let mut prev: Option<f64> = None;
    for &price in prices {
        let ema = match prev {
            None => price,
            Some(p) => alpha * price + (1.0 - alpha) * p,
        };
        out.push(ema);
        prev = Some(ema);
    }
    out
}
