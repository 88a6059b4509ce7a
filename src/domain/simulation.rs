//! Trade simulation over a prediction-annotated price series.
//!
//! Single forward pass, no lookahead. On every row the entry check runs
//! first (buy signal while flat), then the exit check (take-profit or
//! stop-loss on the open position, including one opened on the same row).
//! A position still open after the last row stays open: its cost remains
//! deducted from the balance and it never reaches the trade log.

use tracing::{debug, warn};

use super::error::SigtraderError;
use super::metrics::PerformanceMetrics;
use super::model::{Classifier, FeatureMatrix};
use super::position::{OpenPosition, Position, TradeRecord};
use super::price_row::PriceRow;
use super::table::{FeatureTable, PNL_COLUMN, PREDICTED_COLUMN, TARGET_COLUMN};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_RISK_PER_TRADE: f64 = 0.01;
pub const DEFAULT_PROFIT_TARGET: f64 = 0.02;
pub const DEFAULT_STOP_LOSS: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub initial_capital: f64,
    /// Fraction of current balance committed per entry, in (0, 1].
    pub risk_per_trade: f64,
    pub profit_target: f64,
    pub stop_loss: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            risk_per_trade: DEFAULT_RISK_PER_TRADE,
            profit_target: DEFAULT_PROFIT_TARGET,
            stop_loss: DEFAULT_STOP_LOSS,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), SigtraderError> {
        positive("initial_capital", self.initial_capital)?;
        positive("profit_target", self.profit_target)?;
        positive("stop_loss", self.stop_loss)?;
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade <= 1.0) {
            return Err(SigtraderError::invalid_parameter(
                "risk_per_trade",
                format!("must be in (0, 1], got {}", self.risk_per_trade),
            ));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), SigtraderError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SigtraderError::invalid_parameter(
            name,
            format!("must be positive, got {}", value),
        ))
    }
}

/// Raw result of one pass over the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    /// Realized PnL per row; 0.0 except on exit rows.
    pub pnl: Vec<f64>,
    pub trades: Vec<TradeRecord>,
    pub final_balance: f64,
    /// Position left open after the last row, if any.
    pub open_position: Option<OpenPosition>,
    pub entries: usize,
}

struct Simulator<'a> {
    params: &'a SimulationParams,
    balance: f64,
    position: Position,
    trades: Vec<TradeRecord>,
    pnl: Vec<f64>,
    entries: usize,
}

impl<'a> Simulator<'a> {
    fn new(params: &'a SimulationParams, rows: usize) -> Self {
        Self {
            params,
            balance: params.initial_capital,
            position: Position::Flat,
            trades: Vec::new(),
            pnl: vec![0.0; rows],
            entries: 0,
        }
    }

    fn try_enter(&mut self, idx: usize, row: &PriceRow) -> bool {
        if !row.is_buy_signal() || !self.position.is_flat() {
            return false;
        }
        let (open, cost) =
            OpenPosition::enter(idx, row.price, self.balance, self.params.risk_per_trade);
        self.balance -= cost;
        self.position = Position::Open(open);
        self.entries += 1;
        debug!(
            row = %row.key,
            price = row.price,
            units = open.units_held,
            balance = self.balance,
            "entered position"
        );
        true
    }

    fn try_exit(&mut self, idx: usize, row: &PriceRow) -> Option<&TradeRecord> {
        let open = *self.position.as_open()?;
        let hit_target = open.should_take_profit(row.price, self.params.profit_target);
        let hit_stop = open.should_stop_loss(row.price, self.params.stop_loss);
        if !hit_target && !hit_stop {
            return None;
        }

        let trade = TradeRecord::close(&open, idx, row.price);
        self.balance += trade.pnl;
        self.pnl[idx] = trade.pnl;
        self.position = Position::Flat;
        debug!(
            row = %row.key,
            price = row.price,
            pnl = trade.pnl,
            balance = self.balance,
            take_profit = hit_target,
            "exited position"
        );
        self.trades.push(trade);
        self.trades.last()
    }

    fn finish(self) -> SimulationOutcome {
        SimulationOutcome {
            pnl: self.pnl,
            trades: self.trades,
            final_balance: self.balance,
            open_position: self.position.as_open().copied(),
            entries: self.entries,
        }
    }
}

/// Run the position state machine over `rows` in order.
///
/// Fails before touching any row if the parameters are out of range or any
/// price is not a finite positive number.
pub fn simulate(
    rows: &[PriceRow],
    params: &SimulationParams,
) -> Result<SimulationOutcome, SigtraderError> {
    params.validate()?;
    if let Some(bad) = rows.iter().find(|r| !(r.price.is_finite() && r.price > 0.0)) {
        return Err(SigtraderError::InvalidPrice {
            row: bad.key.to_string(),
            price: bad.price,
        });
    }

    let mut sim = Simulator::new(params, rows.len());
    for (idx, row) in rows.iter().enumerate() {
        sim.try_enter(idx, row);
        sim.try_exit(idx, row);
    }

    let outcome = sim.finish();
    if let Some(open) = &outcome.open_position {
        warn!(
            entry_row = open.entry_row,
            entry_price = open.entry_price,
            units = open.units_held,
            "position still open at end of series; excluded from final balance"
        );
    }
    Ok(outcome)
}

/// Input table augmented with `predicted` and `PnL` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    pub table: FeatureTable,
    pub trades: Vec<TradeRecord>,
    pub open_position: Option<OpenPosition>,
}

impl AnnotatedSeries {
    pub fn pnl(&self) -> &[f64] {
        self.table.column(PNL_COLUMN).unwrap_or(&[])
    }

    pub fn predictions(&self) -> &[f64] {
        self.table.column(PREDICTED_COLUMN).unwrap_or(&[])
    }

    /// Running sum of the per-row PnL column.
    pub fn cumulative_pnl(&self) -> Vec<f64> {
        self.pnl()
            .iter()
            .scan(0.0, |acc, &p| {
                *acc += p;
                Some(*acc)
            })
            .collect()
    }
}

/// Simulate trading on `table`, using its `predicted` column or, when that
/// is absent, predictions from `classifier` over every column except
/// target, predicted and PnL.
///
/// The caller's table is not modified; the returned series is a new table.
pub fn simulate_trading(
    table: &FeatureTable,
    price_column: &str,
    classifier: Option<&dyn Classifier>,
    params: &SimulationParams,
) -> Result<(PerformanceMetrics, AnnotatedSeries), SigtraderError> {
    params.validate()?;
    let prices = table.require_column(price_column)?;

    let supplied = table.has_column(PREDICTED_COLUMN);
    let predictions: Vec<u8> = match table.column(PREDICTED_COLUMN) {
        Some(values) => values.iter().map(|&v| u8::from(v == 1.0)).collect(),
        None => {
            let classifier =
                classifier.ok_or_else(|| SigtraderError::missing_column(PREDICTED_COLUMN))?;
            let features = FeatureMatrix::from_table(
                table,
                &[TARGET_COLUMN, PREDICTED_COLUMN, PNL_COLUMN],
            );
            let predicted = classifier.predict(&features)?;
            if predicted.len() != table.len() {
                return Err(SigtraderError::Model {
                    reason: format!(
                        "classifier returned {} predictions for {} rows",
                        predicted.len(),
                        table.len()
                    ),
                });
            }
            predicted
        }
    };

    let rows: Vec<PriceRow> = prices
        .iter()
        .zip(&predictions)
        .enumerate()
        .map(|(i, (&price, &prediction))| PriceRow {
            key: table.row_key(i),
            price,
            prediction,
        })
        .collect();

    let outcome = simulate(&rows, params)?;
    let metrics =
        PerformanceMetrics::compute(&outcome.trades, params.initial_capital, outcome.final_balance);

    // A caller-supplied prediction column is kept as given.
    let mut annotated = table.clone();
    if !supplied {
        annotated.insert_column(
            PREDICTED_COLUMN,
            predictions.iter().map(|&p| f64::from(p)).collect(),
        )?;
    }
    annotated.insert_column(PNL_COLUMN, outcome.pnl)?;

    Ok((
        metrics,
        AnnotatedSeries {
            table: annotated,
            trades: outcome.trades,
            open_position: outcome.open_position,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rows(prices: &[f64], predictions: &[u8]) -> Vec<PriceRow> {
        prices
            .iter()
            .zip(predictions)
            .enumerate()
            .map(|(i, (&p, &s))| PriceRow::new(i, p, s))
            .collect()
    }

    #[test]
    fn default_params() {
        let p = SimulationParams::default();
        assert_eq!(p.initial_capital, 10_000.0);
        assert_eq!(p.risk_per_trade, 0.01);
        assert_eq!(p.profit_target, 0.02);
        assert_eq!(p.stop_loss, 0.01);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_capital() {
        let p = SimulationParams {
            initial_capital: 0.0,
            ..SimulationParams::default()
        };
        let err = p.validate().unwrap_err();
        assert!(matches!(err, SigtraderError::InvalidParameter { name, .. } if name == "initial_capital"));
    }

    #[test]
    fn validate_rejects_risk_out_of_range() {
        for risk in [0.0, -0.1, 1.5, f64::NAN] {
            let p = SimulationParams {
                risk_per_trade: risk,
                ..SimulationParams::default()
            };
            assert!(p.validate().is_err(), "risk {} should be rejected", risk);
        }
        let full = SimulationParams {
            risk_per_trade: 1.0,
            ..SimulationParams::default()
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_thresholds() {
        let p = SimulationParams {
            profit_target: 0.0,
            ..SimulationParams::default()
        };
        assert!(p.validate().is_err());
        let p = SimulationParams {
            stop_loss: -0.01,
            ..SimulationParams::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn take_profit_exit() {
        let out = simulate(
            &rows(&[100.0, 102.0, 101.0, 105.0, 110.0], &[1, 0, 0, 0, 0]),
            &SimulationParams::default(),
        )
        .unwrap();

        assert_eq!(out.trades.len(), 1);
        assert_relative_eq!(out.trades[0].pnl, 2.0, epsilon = 1e-9);
        assert_eq!(out.trades[0].exit_row, 1);
        assert_relative_eq!(out.final_balance, 9_902.0, epsilon = 1e-9);
        assert_eq!(out.pnl[0], 0.0);
        assert_relative_eq!(out.pnl[1], 2.0, epsilon = 1e-9);
        assert!(out.pnl[2..].iter().all(|&p| p == 0.0));
        assert!(out.open_position.is_none());
    }

    #[test]
    fn stop_loss_exit() {
        let out = simulate(
            &rows(&[100.0, 99.5, 98.9], &[1, 0, 0]),
            &SimulationParams::default(),
        )
        .unwrap();

        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades[0].exit_row, 2);
        assert_relative_eq!(out.trades[0].pnl, -1.1, epsilon = 1e-9);
    }

    #[test]
    fn signal_ignored_while_open() {
        let out = simulate(
            &rows(&[100.0, 100.5, 101.0, 102.0], &[1, 1, 1, 0]),
            &SimulationParams::default(),
        )
        .unwrap();

        assert_eq!(out.entries, 1);
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades[0].entry_row, 0);
    }

    #[test]
    fn reenters_after_exit() {
        let out = simulate(
            &rows(&[100.0, 102.0, 50.0, 51.0], &[1, 0, 1, 0]),
            &SimulationParams::default(),
        )
        .unwrap();

        assert_eq!(out.entries, 2);
        assert_eq!(out.trades.len(), 2);
        assert_eq!(out.trades[1].entry_row, 2);
        assert_eq!(out.trades[1].exit_row, 3);
    }

    #[test]
    fn open_position_excluded_from_balance() {
        let out = simulate(
            &rows(&[100.0, 100.5, 101.0], &[1, 0, 0]),
            &SimulationParams::default(),
        )
        .unwrap();

        assert!(out.trades.is_empty());
        let open = out.open_position.unwrap();
        assert_relative_eq!(open.units_held, 1.0);
        assert_relative_eq!(out.final_balance, 9_900.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_non_positive_price_before_simulating() {
        let err = simulate(
            &rows(&[100.0, 0.0], &[1, 0]),
            &SimulationParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SigtraderError::InvalidPrice { row, .. } if row == "1"));
    }

    #[test]
    fn simulate_trading_requires_price_column() {
        let table = FeatureTable::with_len(2)
            .with_column(PREDICTED_COLUMN, vec![1.0, 0.0])
            .unwrap();
        let err = simulate_trading(&table, "Close_1h", None, &SimulationParams::default())
            .unwrap_err();
        assert!(matches!(err, SigtraderError::MissingColumn { column } if column == "Close_1h"));
    }

    #[test]
    fn simulate_trading_without_predictions_or_model_fails() {
        let table = FeatureTable::with_len(2)
            .with_column("Close_1h", vec![100.0, 101.0])
            .unwrap();
        let err = simulate_trading(&table, "Close_1h", None, &SimulationParams::default())
            .unwrap_err();
        assert!(matches!(err, SigtraderError::MissingColumn { column } if column == PREDICTED_COLUMN));
    }

    #[test]
    fn simulate_trading_annotates_copy() {
        let table = FeatureTable::with_len(3)
            .with_column("Close_1h", vec![100.0, 102.0, 103.0])
            .unwrap()
            .with_column(PREDICTED_COLUMN, vec![1.0, 0.0, 0.0])
            .unwrap();
        let (metrics, series) =
            simulate_trading(&table, "Close_1h", None, &SimulationParams::default()).unwrap();

        assert!(!table.has_column(PNL_COLUMN));
        assert_eq!(series.pnl().len(), 3);
        assert_relative_eq!(series.pnl()[1], 2.0, epsilon = 1e-9);
        assert_eq!(series.predictions(), &[1.0, 0.0, 0.0]);
        assert_relative_eq!(series.cumulative_pnl()[2], 2.0, epsilon = 1e-9);
        assert_eq!(metrics.total_trades, 1);
    }

    #[test]
    fn simulate_trading_keeps_supplied_predictions() {
        let table = FeatureTable::with_len(4)
            .with_column("Close_1h", vec![100.0, 102.0, 103.0, 104.0])
            .unwrap()
            .with_column(PREDICTED_COLUMN, vec![2.0, 1.0, f64::NAN, 0.0])
            .unwrap();
        let (metrics, series) =
            simulate_trading(&table, "Close_1h", None, &SimulationParams::default()).unwrap();

        // 2.0 is not a buy signal; the entry happens on row 1
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(series.open_position.unwrap().entry_row, 1);
        let predicted = series.predictions();
        assert_eq!(predicted[0], 2.0);
        assert_eq!(predicted[1], 1.0);
        assert!(predicted[2].is_nan());
        assert_eq!(predicted[3], 0.0);
    }
}
