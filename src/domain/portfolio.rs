//! Portfolio state: cash, open positions and the latest mark per symbol.
//!
//! The portfolio is the only owner of positions. Every rejected operation
//! leaves it exactly as it was. Positions and marks live in ordered maps so
//! that equity sums, and therefore sizing, are reproducible run to run.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::warn;

use super::asset::AssetClass;
use super::error::PortfolioError;
use super::execution::Sizer;
use super::position::{Position, PositionSide, Trade};
use super::signal::{Action, Decision};
use super::tick::Tick;

/// Last observed price for a symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// What an applied decision changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Opened(Position),
    Closed(Trade),
    Held,
}

impl Applied {
    pub fn trade(&self) -> Option<&Trade> {
        match self {
            Applied::Closed(trade) => Some(trade),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    cash: f64,
    initial_cash: f64,
    sizer: Sizer,
    positions: BTreeMap<String, Position>,
    marks: BTreeMap<String, Mark>,
}

impl Portfolio {
    pub fn new(initial_cash: f64, sizer: Sizer) -> Self {
        Portfolio {
            cash: initial_cash,
            initial_cash,
            sizer,
            positions: BTreeMap::new(),
            marks: BTreeMap::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn position_side(&self, symbol: &str) -> PositionSide {
        self.positions
            .get(symbol)
            .map_or(PositionSide::Flat, |p| p.side)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn mark(&self, symbol: &str) -> Option<Mark> {
        self.marks.get(symbol).copied()
    }

    /// Record the tick's close as the symbol's latest price. Never trades.
    pub fn mark_to_market(&mut self, tick: &Tick) {
        self.marks.insert(
            tick.symbol.clone(),
            Mark {
                price: tick.close,
                timestamp: tick.timestamp,
            },
        );
    }

    /// Cash plus every open position valued at its latest mark.
    pub fn equity(&self) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = self
                    .marks
                    .get(&pos.symbol)
                    .map_or(pos.entry_price, |m| m.price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.positions
            .values()
            .filter_map(|pos| {
                self.marks
                    .get(&pos.symbol)
                    .map(|m| pos.unrealized_pnl(m.price))
            })
            .sum()
    }

    /// Apply a decision at the tick's close.
    ///
    /// Opens reserve the position's notional from cash and fail with
    /// `InsufficientCash`/`ZeroQuantity` when sizing cannot be satisfied.
    /// A close releases the position's market value and returns the trade.
    /// An action that does not fit the symbol's current side is an
    /// `InvalidTransition`.
    pub fn apply(
        &mut self,
        decision: &Decision,
        tick: &Tick,
        class: AssetClass,
    ) -> Result<Applied, PortfolioError> {
        self.mark_to_market(tick);
        let side = self.position_side(&decision.symbol);
        match (decision.action, side) {
            (Action::Hold, _) => Ok(Applied::Held),
            (Action::OpenLong, PositionSide::Flat) => {
                self.open(decision, tick, class, PositionSide::Long)
            }
            (Action::OpenShort, PositionSide::Flat) => {
                self.open(decision, tick, class, PositionSide::Short)
            }
            (Action::Close, PositionSide::Long | PositionSide::Short) => {
                self.close(&decision.symbol, tick.close, decision.timestamp)
            }
            (action, from) => Err(PortfolioError::InvalidTransition {
                symbol: decision.symbol.clone(),
                from,
                action,
            }),
        }
    }

    fn open(
        &mut self,
        decision: &Decision,
        tick: &Tick,
        class: AssetClass,
        side: PositionSide,
    ) -> Result<Applied, PortfolioError> {
        let price = tick.close;
        let quantity = self.sizer.quantity(price, self.cash, self.equity(), class);
        if quantity <= 0.0 {
            return Err(PortfolioError::ZeroQuantity {
                symbol: decision.symbol.clone(),
                price,
            });
        }

        let notional = quantity * price;
        if notional > self.cash {
            return Err(PortfolioError::InsufficientCash {
                symbol: decision.symbol.clone(),
                required: notional,
                available: self.cash,
            });
        }

        self.cash -= notional;
        let position = Position {
            symbol: decision.symbol.clone(),
            side,
            quantity,
            entry_price: price,
            entry_timestamp: decision.timestamp,
        };
        self.positions
            .insert(position.symbol.clone(), position.clone());
        Ok(Applied::Opened(position))
    }

    fn close(
        &mut self,
        symbol: &str,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Applied, PortfolioError> {
        let Some(position) = self.positions.remove(symbol) else {
            return Err(PortfolioError::InvalidTransition {
                symbol: symbol.to_string(),
                from: PositionSide::Flat,
                action: Action::Close,
            });
        };
        self.cash += position.market_value(price);
        Ok(Applied::Closed(Trade::from_close(&position, price, timestamp)))
    }

    /// Close every open position at its symbol's latest mark, in symbol order.
    ///
    /// A position whose mark is not later than its entry stays open: a trade
    /// must exit strictly after it entered.
    pub fn close_all(&mut self) -> Vec<Trade> {
        let symbols: Vec<String> = self.positions.keys().cloned().collect();
        let mut trades = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let (Some(mark), Some(entry)) = (
                self.marks.get(&symbol).copied(),
                self.positions.get(&symbol).map(|p| p.entry_timestamp),
            ) else {
                continue;
            };
            if mark.timestamp <= entry {
                warn!(
                    symbol = %symbol,
                    entry = %entry,
                    "cannot close position opened on its last tick, leaving open"
                );
                continue;
            }
            if let Ok(Applied::Closed(trade)) = self.close(&symbol, mark.price, mark.timestamp) {
                trades.push(trade);
            }
        }
        trades
    }
}
