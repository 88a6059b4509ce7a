//! Position lifecycle: flat or holding one long position.

/// Simulation position state. At most one position is open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Open(OpenPosition),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub entry_row: usize,
    pub entry_price: f64,
    pub units_held: f64,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn as_open(&self) -> Option<&OpenPosition> {
        match self {
            Position::Flat => None,
            Position::Open(open) => Some(open),
        }
    }
}

impl OpenPosition {
    /// Commit `balance * risk_per_trade` of cash at `price`. Returns the new
    /// position and the cash outlay.
    pub fn enter(entry_row: usize, price: f64, balance: f64, risk_per_trade: f64) -> (Self, f64) {
        let units_held = balance * risk_per_trade / price;
        let position = OpenPosition {
            entry_row,
            entry_price: price,
            units_held,
        };
        (position, units_held * price)
    }

    /// Fractional return relative to the entry price.
    pub fn return_at(&self, price: f64) -> f64 {
        price / self.entry_price - 1.0
    }

    pub fn should_take_profit(&self, price: f64, profit_target: f64) -> bool {
        self.return_at(price) >= profit_target
    }

    pub fn should_stop_loss(&self, price: f64, stop_loss: f64) -> bool {
        self.return_at(price) <= -stop_loss
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.units_held * (price - self.entry_price)
    }
}

/// A completed round-trip trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub entry_row: usize,
    pub exit_row: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub units: f64,
    pub pnl: f64,
}

impl TradeRecord {
    pub fn close(position: &OpenPosition, exit_row: usize, exit_price: f64) -> Self {
        TradeRecord {
            entry_row: position.entry_row,
            exit_row,
            entry_price: position.entry_price,
            exit_price,
            units: position.units_held,
            pnl: position.unrealized_pnl(exit_price),
        }
    }

    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}
