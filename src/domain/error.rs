//! Domain error types.
//!
//! Each pipeline stage owns a narrow error enum; [`RevtraderError`] is the
//! top-level type surfaced to callers of the engine.

use chrono::{DateTime, Utc};

use crate::domain::position::PositionSide;
use crate::domain::signal::Action;

/// A tick that violates the OHLCV invariants. The engine rejects the tick
/// and continues with the next one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TickError {
    #[error("malformed tick: empty symbol at {timestamp}")]
    EmptySymbol { timestamp: DateTime<Utc> },

    #[error("malformed tick {symbol}@{timestamp}: non-finite price")]
    NonFinitePrice {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("malformed tick {symbol}@{timestamp}: high {high} below low {low}")]
    HighBelowLow {
        symbol: String,
        timestamp: DateTime<Utc>,
        high: f64,
        low: f64,
    },

    #[error("malformed tick {symbol}@{timestamp}: close {close} outside [{low}, {high}]")]
    CloseOutOfRange {
        symbol: String,
        timestamp: DateTime<Utc>,
        close: f64,
        low: f64,
        high: f64,
    },

    #[error("malformed tick {symbol}@{timestamp}: negative volume {volume}")]
    NegativeVolume {
        symbol: String,
        timestamp: DateTime<Utc>,
        volume: i64,
    },

    #[error("stale tick {symbol}@{timestamp}: not after previous tick at {previous}")]
    NotAfterPrevious {
        symbol: String,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
}

/// A decision the portfolio refused to apply. State is unchanged on every variant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortfolioError {
    #[error("insufficient cash to open {symbol}: need {required:.2}, have {available:.2}")]
    InsufficientCash {
        symbol: String,
        required: f64,
        available: f64,
    },

    #[error("position size for {symbol} rounds to zero at price {price}")]
    ZeroQuantity { symbol: String, price: f64 },

    #[error("invalid transition for {symbol}: {action} while {from}")]
    InvalidTransition {
        symbol: String,
        from: PositionSide,
        action: Action,
    },
}

/// Failure reported by a tick source collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("source {source_name} disconnected: {reason}")]
    Disconnected { source_name: String, reason: String },

    #[error("source {source_name} delivered malformed data: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("source {source_name}: {symbol} timestamp {timestamp} does not advance past {previous}")]
    NonMonotonic {
        source_name: String,
        symbol: String,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
}

/// Failure reported by an execution venue collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VenueError {
    #[error("venue rejected order {client_order_id}: {reason}")]
    Rejected {
        client_order_id: String,
        reason: String,
    },

    #[error("venue unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Top-level error type for revtrader.
#[derive(Debug, thiserror::Error)]
pub enum RevtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    /// Aggregator and portfolio disagree about a symbol's state. Fatal.
    #[error("engine desync: {0}")]
    Desync(PortfolioError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RevtraderError> for std::process::ExitCode {
    fn from(err: &RevtraderError) -> Self {
        let code: u8 = match err {
            RevtraderError::Io(_) => 1,
            RevtraderError::ConfigParse { .. }
            | RevtraderError::ConfigMissing { .. }
            | RevtraderError::ConfigInvalid { .. } => 2,
            RevtraderError::Source(_) => 3,
            RevtraderError::Desync(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
