//! Append-only trade and cash ledger.
//!
//! Records closed trades, periodic cash/equity snapshots, reconciled venue
//! fills and venue order rejections. There is no way to edit or remove an
//! entry once recorded; callers read the ordered slices for export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::execution::{OrderRequest, OrderSide};
use super::position::Trade;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cash: f64,
    pub equity: f64,
}

/// A venue fill matched against the order the engine assumed it would get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    pub client_order_id: String,
    pub venue_order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub assumed_price: f64,
    pub assumed_quantity: f64,
    pub filled_price: f64,
    pub filled_quantity: f64,
    pub timestamp: DateTime<Utc>,
}

impl FillRecord {
    pub fn price_slippage(&self) -> f64 {
        self.filled_price - self.assumed_price
    }

    pub fn quantity_shortfall(&self) -> f64 {
        self.assumed_quantity - self.filled_quantity
    }

    /// True when the venue filled exactly what was assumed.
    pub fn matches_assumed(&self) -> bool {
        self.price_slippage().abs() < 1e-9 && self.quantity_shortfall().abs() < 1e-9
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRejection {
    pub order: OrderRequest,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    trades: Vec<Trade>,
    cash_history: Vec<CashSnapshot>,
    fills: Vec<FillRecord>,
    rejections: Vec<OrderRejection>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn record_cash_snapshot(&mut self, timestamp: DateTime<Utc>, cash: f64, equity: f64) {
        self.cash_history.push(CashSnapshot {
            timestamp,
            cash,
            equity,
        });
    }

    pub fn record_fill(&mut self, fill: FillRecord) {
        self.fills.push(fill);
    }

    pub fn record_order_rejection(&mut self, order: OrderRequest, reason: impl Into<String>) {
        self.rejections.push(OrderRejection {
            order,
            reason: reason.into(),
        });
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn cash_history(&self) -> &[CashSnapshot] {
        &self.cash_history
    }

    pub fn fills(&self) -> &[FillRecord] {
        &self.fills
    }

    pub fn order_rejections(&self) -> &[OrderRejection] {
        &self.rejections
    }

    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.realized_pnl).sum()
    }
}
