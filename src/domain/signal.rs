//! Strategy votes and the aggregated decision derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

/// One strategy's vote for a symbol at a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub strategy_id: String,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    OpenLong,
    OpenShort,
    Close,
    Hold,
}

/// The aggregator's resolved action for a symbol at a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub action: Action,
}

impl Decision {
    pub fn hold(symbol: &str, timestamp: DateTime<Utc>) -> Self {
        Decision {
            symbol: symbol.to_string(),
            timestamp,
            action: Action::Hold,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
            Direction::Hold => write!(f, "HOLD"),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::OpenLong => write!(f, "OPEN_LONG"),
            Action::OpenShort => write!(f, "OPEN_SHORT"),
            Action::Close => write!(f, "CLOSE"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn direction_display() {
        assert_eq!(Direction::Buy.to_string(), "BUY");
        assert_eq!(Direction::Sell.to_string(), "SELL");
        assert_eq!(Direction::Hold.to_string(), "HOLD");
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::OpenLong.to_string(), "OPEN_LONG");
        assert_eq!(Action::OpenShort.to_string(), "OPEN_SHORT");
        assert_eq!(Action::Close.to_string(), "CLOSE");
        assert_eq!(Action::Hold.to_string(), "HOLD");
    }

    #[test]
    fn hold_decision() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        let d = Decision::hold("AAPL", ts);
        assert!(d.is_hold());
        assert_eq!(d.symbol, "AAPL");
        assert_eq!(d.timestamp, ts);
    }
}
