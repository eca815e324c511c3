//! Tick representation: one OHLCV observation for one symbol at one instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::TickError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Tick {
    /// Build a tick and check it in one step.
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Result<Self, TickError> {
        let tick = Tick {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        tick.validate()?;
        Ok(tick)
    }

    /// Check the OHLCV invariants: high >= low, low <= close <= high, volume >= 0.
    pub fn validate(&self) -> Result<(), TickError> {
        if self.symbol.trim().is_empty() {
            return Err(TickError::EmptySymbol {
                timestamp: self.timestamp,
            });
        }
        if ![self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
        {
            return Err(TickError::NonFinitePrice {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
            });
        }
        if self.high < self.low {
            return Err(TickError::HighBelowLow {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                high: self.high,
                low: self.low,
            });
        }
        if self.close < self.low || self.close > self.high {
            return Err(TickError::CloseOutOfRange {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }
        if self.volume < 0 {
            return Err(TickError::NegativeVolume {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                volume: self.volume,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap()
    }

    fn sample_tick() -> Tick {
        Tick {
            symbol: "NVDA".into(),
            timestamp: ts(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn valid_tick_passes() {
        assert!(sample_tick().validate().is_ok());
    }

    #[test]
    fn new_validates() {
        let tick = Tick::new("NVDA", ts(), 100.0, 110.0, 90.0, 105.0, 10).unwrap();
        assert_eq!(tick.symbol, "NVDA");
        assert!(Tick::new("NVDA", ts(), 100.0, 90.0, 110.0, 100.0, 10).is_err());
    }

    #[test]
    fn flat_bar_is_valid() {
        let tick = Tick {
            open: 50.0,
            high: 50.0,
            low: 50.0,
            close: 50.0,
            volume: 0,
            ..sample_tick()
        };
        assert!(tick.validate().is_ok());
    }

    #[test]
    fn high_below_low_rejected() {
        let tick = Tick {
            high: 80.0,
            ..sample_tick()
        };
        assert!(matches!(
            tick.validate(),
            Err(TickError::HighBelowLow { .. })
        ));
    }

    #[test]
    fn close_above_high_rejected() {
        let tick = Tick {
            close: 111.0,
            ..sample_tick()
        };
        assert!(matches!(
            tick.validate(),
            Err(TickError::CloseOutOfRange { .. })
        ));
    }

    #[test]
    fn close_below_low_rejected() {
        let tick = Tick {
            close: 89.5,
            ..sample_tick()
        };
        assert!(matches!(
            tick.validate(),
            Err(TickError::CloseOutOfRange { .. })
        ));
    }

    #[test]
    fn negative_volume_rejected() {
        let tick = Tick {
            volume: -1,
            ..sample_tick()
        };
        assert_eq!(
            tick.validate(),
            Err(TickError::NegativeVolume {
                symbol: "NVDA".into(),
                timestamp: ts(),
                volume: -1,
            })
        );
    }

    #[test]
    fn nan_price_rejected() {
        let tick = Tick {
            open: f64::NAN,
            ..sample_tick()
        };
        assert!(matches!(
            tick.validate(),
            Err(TickError::NonFinitePrice { .. })
        ));
    }

    #[test]
    fn blank_symbol_rejected() {
        let tick = Tick {
            symbol: "  ".into(),
            ..sample_tick()
        };
        assert!(matches!(tick.validate(), Err(TickError::EmptySymbol { .. })));
    }
}
