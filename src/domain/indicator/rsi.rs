//! RSI (Relative Strength Index) over a window of closes.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first `period` changes
//! - Subsequent: avg = (prev_avg * (period-1) + current) / period
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, unless avg_gain is also 0 (flat window): RSI = 50.
//!
//! Needs `period + 1` closes (`period` price changes).

pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| if c > 0.0 { c } else { 0.0 };
    let loss = |c: f64| if c < 0.0 { -c } else { 0.0 };

    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;

    for &c in &changes[period..] {
        avg_gain = (avg_gain * (period - 1) as f64 + gain(c)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(c)) / period as f64;
    }

    let value = if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };
    Some(value)
}
