//! Asset classes and the per-class shorting policy.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Equity,
    Crypto,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Equity => write!(f, "equity"),
            AssetClass::Crypto => write!(f, "crypto"),
        }
    }
}

/// Maps symbols to asset classes: explicit crypto overrides first, then
/// pair notation (`BTC/USD`) marks crypto, everything else is equity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetClassifier {
    crypto_overrides: HashSet<String>,
}

impl AssetClassifier {
    pub fn with_crypto_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AssetClassifier {
            crypto_overrides: symbols
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn classify(&self, symbol: &str) -> AssetClass {
        if symbol.contains('/') || self.crypto_overrides.contains(&symbol.to_ascii_uppercase()) {
            AssetClass::Crypto
        } else {
            AssetClass::Equity
        }
    }
}

/// Which asset classes may open short positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortingPolicy {
    pub equity: bool,
    pub crypto: bool,
}

impl Default for ShortingPolicy {
    fn default() -> Self {
        // Crypto is long-only.
        ShortingPolicy {
            equity: true,
            crypto: false,
        }
    }
}

impl ShortingPolicy {
    pub fn allows(&self, class: AssetClass) -> bool {
        match class {
            AssetClass::Equity => self.equity,
            AssetClass::Crypto => self.crypto,
        }
    }
}
