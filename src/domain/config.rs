//! Engine configuration.

use crate::domain::asset::{AssetClassifier, ShortingPolicy};
use crate::domain::config_validation::validate_engine_config;
use crate::domain::error::RevtraderError;
use crate::domain::execution::{Sizer, SizingPolicy};
use crate::domain::strategy::StrategySpec;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub initial_cash: f64,
    pub quorum: usize,
    /// Record a cash snapshot every N processed ticks.
    pub snapshot_interval: usize,
    pub close_on_finish: bool,
    /// Depth of the live intake queue.
    pub intake_capacity: usize,
    pub sizer: Sizer,
    pub strategies: Vec<StrategySpec>,
    pub shorting: ShortingPolicy,
    pub classifier: AssetClassifier,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_cash: 100_000.0,
            quorum: 2,
            snapshot_interval: 1,
            close_on_finish: true,
            intake_capacity: 4096,
            sizer: Sizer::default(),
            strategies: vec![
                StrategySpec::Rsi {
                    period: 3,
                    oversold: 20.0,
                    overbought: 80.0,
                },
                StrategySpec::Bollinger {
                    period: 20,
                    num_std: 2.0,
                },
                StrategySpec::ZScore {
                    period: 60,
                    threshold: 2.0,
                },
            ],
            shorting: ShortingPolicy::default(),
            classifier: AssetClassifier::default(),
        }
    }
}

impl EngineConfig {
    /// Validate and read the engine settings. Missing keys fall back to
    /// [`EngineConfig::default`].
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, RevtraderError> {
        validate_engine_config(config)?;

        let fraction = config.get_double("sizing", "fraction", 0.02);
        let policy = match config
            .get_string("sizing", "policy")
            .map(|p| p.trim().to_lowercase())
            .as_deref()
        {
            Some("fraction_of_cash") => SizingPolicy::FractionOfCash(fraction),
            Some("fixed_notional") => {
                SizingPolicy::FixedNotional(config.get_double("sizing", "notional", 0.0))
            }
            _ => SizingPolicy::FractionOfEquity(fraction),
        };

        let mut strategies = Vec::new();
        if config.get_bool("rsi", "enabled", true) {
            strategies.push(StrategySpec::Rsi {
                period: config.get_int("rsi", "period", 3) as usize,
                oversold: config.get_double("rsi", "oversold", 20.0),
                overbought: config.get_double("rsi", "overbought", 80.0),
            });
        }
        if config.get_bool("bollinger", "enabled", true) {
            strategies.push(StrategySpec::Bollinger {
                period: config.get_int("bollinger", "period", 20) as usize,
                num_std: config.get_double("bollinger", "num_std", 2.0),
            });
        }
        if config.get_bool("zscore", "enabled", true) {
            strategies.push(StrategySpec::ZScore {
                period: config.get_int("zscore", "period", 60) as usize,
                threshold: config.get_double("zscore", "threshold", 2.0),
            });
        }

        let classifier = config
            .get_string("universe", "crypto")
            .map(|list| AssetClassifier::with_crypto_symbols(list.split(',')))
            .unwrap_or_default();

        Ok(EngineConfig {
            initial_cash: config.get_double("engine", "initial_cash", 100_000.0),
            quorum: config.get_int("engine", "quorum", 2) as usize,
            snapshot_interval: config.get_int("engine", "snapshot_interval", 1) as usize,
            close_on_finish: config.get_bool("engine", "close_on_finish", true),
            intake_capacity: config.get_int("engine", "intake_capacity", 4096) as usize,
            sizer: Sizer {
                policy,
                crypto_decimals: config.get_int("sizing", "crypto_decimals", 6) as u32,
            },
            strategies,
            shorting: ShortingPolicy {
                equity: config.get_bool("shorting", "equity", true),
                crypto: config.get_bool("shorting", "crypto", false),
            },
            classifier,
        })
    }
}
