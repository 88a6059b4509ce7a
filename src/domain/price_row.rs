//! Single step of the simulated price series.

use super::table::RowKey;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRow {
    pub key: RowKey,
    pub price: f64,
    /// 1 = buy signal, 0 = no signal.
    pub prediction: u8,
}

impl PriceRow {
    pub fn new(index: usize, price: f64, prediction: u8) -> Self {
        Self {
            key: RowKey::Seq(index),
            price,
            prediction,
        }
    }

    pub fn is_buy_signal(&self) -> bool {
        self.prediction == 1
    }
}
