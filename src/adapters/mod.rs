//! Concrete adapter implementations for ports.

#[cfg(feature = "live")]
pub mod channel_source;
pub mod file_config_adapter;
#[cfg(feature = "live")]
pub mod paper_venue;
