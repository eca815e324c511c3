//! Port traits for the engine's collaborators.

pub mod config_port;
#[cfg(feature = "live")]
pub mod tick_source;
pub mod venue;
