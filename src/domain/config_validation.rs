//! Configuration validation.
//!
//! Checks every engine setting before an `EngineConfig` is built, so a bad
//! file fails fast with the offending section and key.

use crate::domain::error::RevtraderError;
use crate::ports::config_port::ConfigPort;

pub const SIZING_POLICIES: [&str; 3] = ["fraction_of_equity", "fraction_of_cash", "fixed_notional"];

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), RevtraderError> {
    validate_initial_cash(config)?;
    validate_counts(config)?;
    validate_sizing(config)?;
    validate_rsi(config)?;
    validate_bollinger(config)?;
    validate_zscore(config)?;
    validate_quorum(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> RevtraderError {
    RevtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Number of strategies switched on in `[rsi]`, `[bollinger]` and `[zscore]`.
pub fn enabled_strategy_count(config: &dyn ConfigPort) -> usize {
    ["rsi", "bollinger", "zscore"]
        .iter()
        .filter(|section| config.get_bool(section, "enabled", true))
        .count()
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), RevtraderError> {
    let value = config.get_double("engine", "initial_cash", 100_000.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("engine", "initial_cash", "initial_cash must be positive"));
    }
    Ok(())
}

fn validate_counts(config: &dyn ConfigPort) -> Result<(), RevtraderError> {
    if config.get_int("engine", "snapshot_interval", 1) < 1 {
        return Err(invalid(
            "engine",
            "snapshot_interval",
            "snapshot_interval must be at least 1",
        ));
    }
    if config.get_int("engine", "intake_capacity", 4096) < 1 {
        return Err(invalid(
            "engine",
            "intake_capacity",
            "intake_capacity must be at least 1",
        ));
    }
    Ok(())
}

fn validate_sizing(config: &dyn ConfigPort) -> Result<(), RevtraderError> {
    let policy = config
        .get_string("sizing", "policy")
        .map(|p| p.trim().to_lowercase())
        .unwrap_or_else(|| SIZING_POLICIES[0].to_string());

    match policy.as_str() {
        "fraction_of_equity" | "fraction_of_cash" => {
            let fraction = config.get_double("sizing", "fraction", 0.02);
            if fraction <= 0.0 || fraction > 1.0 {
                return Err(invalid("sizing", "fraction", "fraction must be between 0 and 1"));
            }
        }
        "fixed_notional" => {
            if config.get_string("sizing", "notional").is_none() {
                return Err(RevtraderError::ConfigMissing {
                    section: "sizing".to_string(),
                    key: "notional".to_string(),
                });
            }
            let notional = config.get_double("sizing", "notional", 0.0);
            if !notional.is_finite() || notional <= 0.0 {
                return Err(invalid("sizing", "notional", "notional must be positive"));
            }
        }
        other => {
            return Err(invalid(
                "sizing",
                "policy",
                format!(
                    "unknown policy '{}', expected one of {}",
                    other,
                    SIZING_POLICIES.join(", ")
                ),
            ));
        }
    }

    let decimals = config.get_int("sizing", "crypto_decimals", 6);
    if !(0..=12).contains(&decimals) {
        return Err(invalid(
            "sizing",
            "crypto_decimals",
            "crypto_decimals must be between 0 and 12",
        ));
    }
    Ok(())
}

fn validate_rsi(config: &dyn ConfigPort) -> Result<(), RevtraderError> {
    if !config.get_bool("rsi", "enabled", true) {
        return Ok(());
    }
    if config.get_int("rsi", "period", 3) < 1 {
        return Err(invalid("rsi", "period", "period must be at least 1"));
    }
    let oversold = config.get_double("rsi", "oversold", 20.0);
    let overbought = config.get_double("rsi", "overbought", 80.0);
    if !(0.0..=100.0).contains(&oversold) {
        return Err(invalid("rsi", "oversold", "oversold must be between 0 and 100"));
    }
    if !(0.0..=100.0).contains(&overbought) {
        return Err(invalid("rsi", "overbought", "overbought must be between 0 and 100"));
    }
    if oversold >= overbought {
        return Err(invalid("rsi", "oversold", "oversold must be below overbought"));
    }
    Ok(())
}

fn validate_bollinger(config: &dyn ConfigPort) -> Result<(), RevtraderError> {
    if !config.get_bool("bollinger", "enabled", true) {
        return Ok(());
    }
    if config.get_int("bollinger", "period", 20) < 2 {
        return Err(invalid("bollinger", "period", "period must be at least 2"));
    }
    if config.get_double("bollinger", "num_std", 2.0) <= 0.0 {
        return Err(invalid("bollinger", "num_std", "num_std must be positive"));
    }
    Ok(())
}

fn validate_zscore(config: &dyn ConfigPort) -> Result<(), RevtraderError> {
    if !config.get_bool("zscore", "enabled", true) {
        return Ok(());
    }
    if config.get_int("zscore", "period", 60) < 2 {
        return Err(invalid("zscore", "period", "period must be at least 2"));
    }
    if config.get_double("zscore", "threshold", 2.0) <= 0.0 {
        return Err(invalid("zscore", "threshold", "threshold must be positive"));
    }
    Ok(())
}

fn validate_quorum(config: &dyn ConfigPort) -> Result<(), RevtraderError> {
    let enabled = enabled_strategy_count(config);
    if enabled == 0 {
        return Err(invalid("engine", "quorum", "no strategies enabled"));
    }
    let quorum = config.get_int("engine", "quorum", 2);
    if quorum < 1 {
        return Err(invalid("engine", "quorum", "quorum must be at least 1"));
    }
    if quorum as usize > enabled {
        return Err(invalid(
            "engine",
            "quorum",
            format!("quorum {} exceeds the {} enabled strategies", quorum, enabled),
        ));
    }
    Ok(())
}
