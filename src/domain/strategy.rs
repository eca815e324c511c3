//! Signal-producing strategies.
//!
//! A strategy reads the tail of one symbol's [`RollingWindow`] and votes
//! BUY, SELL or HOLD. Strategies hold only their parameters, so one instance
//! serves every symbol and the per-symbol state stays in the engine's windows.
//! New variants plug in behind [`Strategy`] without touching the aggregator.

use crate::domain::indicator::bollinger::bollinger_bands;
use crate::domain::indicator::rsi::rsi;
use crate::domain::indicator::zscore::zscore;
use crate::domain::indicator::{IndicatorType, to_x100};
use crate::domain::signal::{Direction, Signal};
use crate::domain::window::RollingWindow;

pub trait Strategy: Send + Sync {
    /// Stable identifier carried on every emitted signal.
    fn id(&self) -> &str;

    /// Number of most recent ticks the indicator needs.
    fn lookback(&self) -> usize;

    /// Vote on exactly `lookback()` closes, oldest first.
    fn direction(&self, closes: &[f64]) -> Direction;

    /// Vote on the window ending at the current tick. A window shorter than
    /// `lookback()` is still warming up and always yields HOLD.
    fn evaluate(&self, window: &RollingWindow) -> Signal {
        let latest = window.latest();
        let direction = match window.closes(self.lookback()) {
            Some(closes) => self.direction(&closes),
            None => Direction::Hold,
        };
        Signal {
            strategy_id: self.id().to_string(),
            symbol: latest.symbol.clone(),
            timestamp: latest.timestamp,
            direction,
        }
    }
}

/// RSI mean reversion: BUY when oversold, SELL when overbought.
#[derive(Debug, Clone)]
pub struct RsiStrategy {
    id: String,
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl RsiStrategy {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        RsiStrategy {
            id: IndicatorType::Rsi(period).to_string(),
            period,
            oversold,
            overbought,
        }
    }
}

impl Strategy for RsiStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookback(&self) -> usize {
        IndicatorType::Rsi(self.period).lookback()
    }

    fn direction(&self, closes: &[f64]) -> Direction {
        match rsi(closes, self.period) {
            Some(value) if value < self.oversold => Direction::Buy,
            Some(value) if value > self.overbought => Direction::Sell,
            _ => Direction::Hold,
        }
    }
}

/// Bollinger mean reversion: BUY below the lower band, SELL above the upper band.
#[derive(Debug, Clone)]
pub struct BollingerStrategy {
    id: String,
    period: usize,
    num_std: f64,
}

impl BollingerStrategy {
    pub fn new(period: usize, num_std: f64) -> Self {
        BollingerStrategy {
            id: IndicatorType::Bollinger {
                period,
                stddev_mult_x100: to_x100(num_std),
            }
            .to_string(),
            period,
            num_std,
        }
    }
}

impl Strategy for BollingerStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn direction(&self, closes: &[f64]) -> Direction {
        let (Some(bands), Some(&price)) =
            (bollinger_bands(closes, self.period, self.num_std), closes.last())
        else {
            return Direction::Hold;
        };
        if price < bands.lower {
            Direction::Buy
        } else if price > bands.upper {
            Direction::Sell
        } else {
            Direction::Hold
        }
    }
}

/// Z-score mean reversion: BUY below -threshold, SELL above +threshold.
#[derive(Debug, Clone)]
pub struct ZScoreStrategy {
    id: String,
    period: usize,
    threshold: f64,
}

impl ZScoreStrategy {
    pub fn new(period: usize, threshold: f64) -> Self {
        ZScoreStrategy {
            id: IndicatorType::ZScore {
                period,
                threshold_x100: to_x100(threshold),
            }
            .to_string(),
            period,
            threshold,
        }
    }
}

impl Strategy for ZScoreStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn direction(&self, closes: &[f64]) -> Direction {
        match zscore(closes, self.period) {
            Some(z) if z < -self.threshold => Direction::Buy,
            Some(z) if z > self.threshold => Direction::Sell,
            _ => Direction::Hold,
        }
    }
}

/// Parameters for one configured strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategySpec {
    Rsi {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    Bollinger {
        period: usize,
        num_std: f64,
    },
    ZScore {
        period: usize,
        threshold: f64,
    },
}

impl StrategySpec {
    pub fn build(&self) -> Box<dyn Strategy> {
        match *self {
            StrategySpec::Rsi {
                period,
                oversold,
                overbought,
            } => Box::new(RsiStrategy::new(period, oversold, overbought)),
            StrategySpec::Bollinger { period, num_std } => {
                Box::new(BollingerStrategy::new(period, num_std))
            }
            StrategySpec::ZScore { period, threshold } => {
                Box::new(ZScoreStrategy::new(period, threshold))
            }
        }
    }
}

pub fn build_strategies(specs: &[StrategySpec]) -> Vec<Box<dyn Strategy>> {
    specs.iter().map(StrategySpec::build).collect()
}
