//! Bollinger Bands over a window of closes.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).

use super::stddev::mean_std;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn bollinger_bands(closes: &[f64], period: usize, mult: f64) -> Option<BollingerBands> {
    let (middle, stddev) = mean_std(closes, period)?;
    Some(BollingerBands {
        upper: middle + mult * stddev,
        middle,
        lower: middle - mult * stddev,
    })
}
