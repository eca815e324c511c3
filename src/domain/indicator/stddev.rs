//! Rolling mean and population standard deviation.
//!
//! STDDEV(n) = sqrt(sum((C[j] - SMA(n))^2) / n), dividing by N, not N-1.

/// Mean and population standard deviation of the last `period` closes.
pub fn mean_std(closes: &[f64], period: usize) -> Option<(f64, f64)> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];

    let mean: f64 = window.iter().sum::<f64>() / period as f64;
    let variance: f64 = window
        .iter()
        .map(|c| {
            let diff = c - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;

    Some((mean, variance.sqrt()))
}
