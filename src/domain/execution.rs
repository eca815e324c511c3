//! Position sizing and order intents.
//!
//! Sizing turns a target notional into a tradable quantity: whole units for
//! equities, fractional units rounded down to a fixed number of decimals for
//! crypto. Every state-changing decision produces an [`OrderRequest`] that a
//! live driver can hand to an execution venue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::asset::AssetClass;
use super::position::{Position, PositionSide, Trade};

/// How much notional a new position targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingPolicy {
    /// Fraction of total equity, capped by available cash.
    FractionOfEquity(f64),
    FractionOfCash(f64),
    FixedNotional(f64),
}

impl Default for SizingPolicy {
    fn default() -> Self {
        SizingPolicy::FractionOfEquity(0.02)
    }
}

impl SizingPolicy {
    pub fn target_notional(&self, cash: f64, equity: f64) -> f64 {
        match *self {
            SizingPolicy::FractionOfEquity(f) => (equity * f).min(cash),
            SizingPolicy::FractionOfCash(f) => cash * f,
            SizingPolicy::FixedNotional(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizer {
    pub policy: SizingPolicy,
    pub crypto_decimals: u32,
}

impl Default for Sizer {
    fn default() -> Self {
        Sizer {
            policy: SizingPolicy::default(),
            crypto_decimals: 6,
        }
    }
}

impl Sizer {
    /// Quantity to open at `price`. Zero when the target buys less than one
    /// tradable unit or the price is not positive.
    pub fn quantity(&self, price: f64, cash: f64, equity: f64, class: AssetClass) -> f64 {
        if price <= 0.0 {
            return 0.0;
        }
        let raw = self.policy.target_notional(cash, equity) / price;
        if !raw.is_finite() || raw <= 0.0 {
            return 0.0;
        }
        round_quantity(raw, class, self.crypto_decimals)
    }
}

/// Round a raw quantity down to what the asset class can trade.
pub fn round_quantity(raw: f64, class: AssetClass, crypto_decimals: u32) -> f64 {
    match class {
        AssetClass::Equity => raw.floor(),
        AssetClass::Crypto => {
            let scale = 10f64.powi(crypto_decimals as i32);
            (raw * scale).floor() / scale
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// An order the engine wants placed, priced at the assumed fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub reference_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl OrderRequest {
    /// Buy to open a long, sell to open a short.
    pub fn for_open(client_order_id: String, position: &Position) -> Self {
        let side = match position.side {
            PositionSide::Short => OrderSide::Sell,
            _ => OrderSide::Buy,
        };
        OrderRequest {
            client_order_id,
            symbol: position.symbol.clone(),
            side,
            quantity: position.quantity,
            reference_price: position.entry_price,
            timestamp: position.entry_timestamp,
        }
    }

    /// Sell to close a long, buy to cover a short.
    pub fn for_close(client_order_id: String, trade: &Trade) -> Self {
        let side = match trade.side {
            PositionSide::Short => OrderSide::Buy,
            _ => OrderSide::Sell,
        };
        OrderRequest {
            client_order_id,
            symbol: trade.symbol.clone(),
            side,
            quantity: trade.quantity,
            reference_price: trade.exit_price,
            timestamp: trade.exit_timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap()
    }

    #[test]
    fn fraction_of_equity_capped_by_cash() {
        let p = SizingPolicy::FractionOfEquity(0.5);
        assert!((p.target_notional(100_000.0, 100_000.0) - 50_000.0).abs() < f64::EPSILON);
        assert!((p.target_notional(10_000.0, 100_000.0) - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fraction_of_cash_and_fixed() {
        assert!((SizingPolicy::FractionOfCash(0.1).target_notional(5_000.0, 1e9) - 500.0).abs() < 1e-9);
        assert!((SizingPolicy::FixedNotional(2_500.0).target_notional(0.0, 0.0) - 2_500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equity_quantity_whole_units() {
        let sizer = Sizer::default();
        // 2% of 100k = 2000 at 150 -> 13.33 -> 13
        let q = sizer.quantity(150.0, 100_000.0, 100_000.0, AssetClass::Equity);
        assert!((q - 13.0).abs() < f64::EPSILON);
    }

    #[test]
    fn crypto_quantity_six_decimals() {
        let sizer = Sizer::default();
        // 2000 / 65_000 = 0.030769230...
        let q = sizer.quantity(65_000.0, 100_000.0, 100_000.0, AssetClass::Crypto);
        assert!((q - 0.030769).abs() < 1e-12);
    }

    #[test]
    fn quantity_zero_when_too_expensive() {
        let sizer = Sizer::default();
        assert_eq!(sizer.quantity(5_000.0, 1_000.0, 1_000.0, AssetClass::Equity), 0.0);
        assert_eq!(sizer.quantity(0.0, 1_000.0, 1_000.0, AssetClass::Equity), 0.0);
        assert_eq!(sizer.quantity(-1.0, 1_000.0, 1_000.0, AssetClass::Crypto), 0.0);
    }

    #[test]
    fn round_quantity_custom_decimals() {
        assert!((round_quantity(1.23456, AssetClass::Crypto, 2) - 1.23).abs() < 1e-12);
        assert!((round_quantity(1.99, AssetClass::Equity, 8) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn order_sides_follow_position_side() {
        let short = Position {
            symbol: "TSLA".into(),
            side: PositionSide::Short,
            quantity: 4.0,
            entry_price: 200.0,
            entry_timestamp: ts(),
        };
        let open = OrderRequest::for_open("o-1".into(), &short);
        assert_eq!(open.side, OrderSide::Sell);
        assert!((open.reference_price - 200.0).abs() < f64::EPSILON);

        let trade = Trade::from_close(&short, 190.0, ts() + chrono::Duration::minutes(1));
        let close = OrderRequest::for_close("o-2".into(), &trade);
        assert_eq!(close.side, OrderSide::Buy);
        assert!((close.quantity - 4.0).abs() < f64::EPSILON);
        assert_eq!(close.timestamp, trade.exit_timestamp);
        assert_eq!(close.side.to_string(), "BUY");
    }
}
