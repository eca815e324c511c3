//! Core domain types and logic.

pub mod aggregator;
pub mod asset;
pub mod config;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod ledger;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod strategy;
pub mod tick;
pub mod timeline;
pub mod window;
