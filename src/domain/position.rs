//! Open positions and the trades they become on close.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Flat,
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(self) -> f64 {
        match self {
            PositionSide::Flat => 0.0,
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Flat => write!(f, "FLAT"),
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// An open position. `quantity` is always positive; direction lives in `side`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_timestamp: DateTime<Utc>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    pub fn entry_notional(&self) -> f64 {
        self.quantity * self.entry_price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity * self.side.sign()
    }

    /// Cash the position is worth if closed at `price`.
    ///
    /// Both sides reserved their entry notional from cash on open, so the
    /// value is that notional plus the running P&L. For a short this is the
    /// escrow released minus the cost to cover.
    pub fn market_value(&self, price: f64) -> f64 {
        self.entry_notional() + self.unrealized_pnl(price)
    }
}

/// A closed round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_timestamp: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_timestamp: DateTime<Utc>,
    pub realized_pnl: f64,
}

impl Trade {
    pub fn from_close(position: &Position, exit_price: f64, exit_timestamp: DateTime<Utc>) -> Self {
        Trade {
            symbol: position.symbol.clone(),
            side: position.side,
            quantity: position.quantity,
            entry_price: position.entry_price,
            entry_timestamp: position.entry_timestamp,
            exit_price,
            exit_timestamp,
            realized_pnl: position.unrealized_pnl(exit_price),
        }
    }

    pub fn is_winner(&self) -> bool {
        self.realized_pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.realized_pnl < 0.0
    }
}
