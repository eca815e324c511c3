//! revtrader: multi-asset mean-reversion trading engine.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The streaming drive mode lives in
//! [`live`] behind the `live` feature; replay mode is [`domain::engine`].

pub mod domain;
pub mod ports;
pub mod adapters;
#[cfg(feature = "live")]
pub mod live;
