//! Z-score of the latest close against its rolling mean.
//!
//! Z = (C[last] - SMA(n)) / STDDEV(n). Undefined when the window has zero variance.

use super::stddev::mean_std;

pub fn zscore(closes: &[f64], period: usize) -> Option<f64> {
    let (mean, stddev) = mean_std(closes, period)?;
    if stddev == 0.0 {
        return None;
    }
    let last = *closes.last()?;
    Some((last - mean) / stddev)
}
