#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use revtrader::domain::config::EngineConfig;
use revtrader::domain::error::VenueError;
use revtrader::domain::execution::{OrderRequest, Sizer, SizingPolicy};
use revtrader::domain::strategy::StrategySpec;
pub use revtrader::domain::tick::Tick;
use revtrader::domain::timeline::TickSeries;
use revtrader::ports::venue::{ExecutionVenue, OrderAck};
use std::collections::HashSet;

pub fn t(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap() + Duration::minutes(minute)
}

pub fn make_tick(symbol: &str, minute: i64, close: f64) -> Tick {
    Tick {
        symbol: symbol.to_string(),
        timestamp: t(minute),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1000,
    }
}

/// One tick per minute starting at `start`.
pub fn make_ticks(symbol: &str, start: i64, closes: &[f64]) -> Vec<Tick> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_tick(symbol, start + i as i64, c))
        .collect()
}

pub fn make_series(name: &str, symbol: &str, closes: &[f64]) -> TickSeries {
    TickSeries::new(name, make_ticks(symbol, 0, closes))
}

/// Two fast RSI voters plus a slow Bollinger voter, quorum 2, fixed 1000
/// notional. Opens after two falling closes and closes after two rising ones.
pub fn two_voter_config() -> EngineConfig {
    EngineConfig {
        initial_cash: 10_000.0,
        quorum: 2,
        sizer: Sizer {
            policy: SizingPolicy::FixedNotional(1_000.0),
            crypto_decimals: 6,
        },
        strategies: vec![
            StrategySpec::Rsi {
                period: 2,
                oversold: 20.0,
                overbought: 80.0,
            },
            StrategySpec::Rsi {
                period: 2,
                oversold: 30.0,
                overbought: 70.0,
            },
            StrategySpec::Bollinger {
                period: 20,
                num_std: 2.0,
            },
        ],
        ..EngineConfig::default()
    }
}

/// Short-lookback versions of all three strategy kinds for property tests.
pub fn busy_config() -> EngineConfig {
    EngineConfig {
        initial_cash: 50_000.0,
        quorum: 2,
        sizer: Sizer {
            policy: SizingPolicy::FractionOfEquity(0.1),
            crypto_decimals: 6,
        },
        strategies: vec![
            StrategySpec::Rsi {
                period: 2,
                oversold: 25.0,
                overbought: 75.0,
            },
            StrategySpec::Bollinger {
                period: 5,
                num_std: 1.0,
            },
            StrategySpec::ZScore {
                period: 5,
                threshold: 1.0,
            },
        ],
        close_on_finish: false,
        ..EngineConfig::default()
    }
}

/// Bounded random walk: each step moves the close by `step`, kept inside
/// [80, 120].
pub fn walk(start: f64, steps: &[f64]) -> Vec<f64> {
    let mut price = start;
    let mut out = Vec::with_capacity(steps.len());
    for step in steps {
        price = (price + step).clamp(80.0, 120.0);
        out.push(price);
    }
    out
}

/// Venue that refuses orders for the listed symbols and accepts the rest
/// without ever filling.
pub struct ScriptedVenue {
    pub refuse: HashSet<String>,
    pub placed: Vec<OrderRequest>,
}

impl ScriptedVenue {
    pub fn refusing(symbols: &[&str]) -> Self {
        ScriptedVenue {
            refuse: symbols.iter().map(|s| s.to_string()).collect(),
            placed: Vec::new(),
        }
    }
}

impl ExecutionVenue for ScriptedVenue {
    fn name(&self) -> &str {
        "scripted"
    }

    fn place_order(&mut self, order: &OrderRequest) -> Result<OrderAck, VenueError> {
        self.placed.push(order.clone());
        if self.refuse.contains(&order.symbol) {
            return Err(VenueError::Rejected {
                client_order_id: order.client_order_id.clone(),
                reason: "symbol halted".to_string(),
            });
        }
        Ok(OrderAck {
            client_order_id: order.client_order_id.clone(),
            venue_order_id: format!("s-{}", self.placed.len()),
        })
    }
}
