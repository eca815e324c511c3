//! Indicator math over closing-price windows.
//!
//! Every function here is pure: it takes the closes of one symbol's rolling
//! window (oldest first) and recomputes from scratch. `None` means the window
//! is too short or the indicator is undefined for it.
//!
//! `IndicatorType` names an indicator with its parameters and doubles as the
//! strategy id carried on each signal.

pub mod bollinger;
pub mod rsi;
pub mod stddev;
pub mod zscore;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    ZScore {
        period: usize,
        threshold_x100: u32,
    },
}

impl IndicatorType {
    /// Number of closes needed before the indicator is defined.
    pub fn lookback(&self) -> usize {
        match self {
            IndicatorType::Rsi(period) => period + 1,
            IndicatorType::Bollinger { period, .. } => *period,
            IndicatorType::ZScore { period, .. } => *period,
        }
    }
}

/// Scale a float parameter into the integer key form used by `IndicatorType`.
pub fn to_x100(value: f64) -> u32 {
    (value * 100.0).round().max(0.0) as u32
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::ZScore {
                period,
                threshold_x100,
            } => {
                let threshold = *threshold_x100 as f64 / 100.0;
                write!(f, "ZSCORE({},{})", period, threshold)
            }
        }
    }
}
