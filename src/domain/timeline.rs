//! Global time ordering of finite tick sources.
//!
//! Each source is split into per-symbol lanes that must be strictly
//! increasing in time, then the lanes are merged by (timestamp, symbol).
//! Ties on both keys keep source order, so the merged sequence is a pure
//! function of the input.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use chrono::{DateTime, Utc};

use crate::domain::error::SourceError;
use crate::domain::tick::Tick;

/// A finite, named tick source for replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSeries {
    pub name: String,
    pub ticks: Vec<Tick>,
}

impl TickSeries {
    pub fn new(name: impl Into<String>, ticks: Vec<Tick>) -> Self {
        TickSeries {
            name: name.into(),
            ticks,
        }
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

fn split_lanes(source: TickSeries) -> Result<Vec<Vec<Tick>>, SourceError> {
    let mut lanes: BTreeMap<String, Vec<Tick>> = BTreeMap::new();
    for tick in source.ticks {
        let lane = lanes.entry(tick.symbol.clone()).or_default();
        if let Some(previous) = lane.last()
            && tick.timestamp <= previous.timestamp
        {
            return Err(SourceError::NonMonotonic {
                source_name: source.name,
                symbol: tick.symbol,
                timestamp: tick.timestamp,
                previous: previous.timestamp,
            });
        }
        lane.push(tick);
    }
    Ok(lanes.into_values().collect())
}

/// Merge finite sources into one globally ordered sequence.
///
/// Fails with `NonMonotonic` if any source repeats or rewinds a symbol's
/// timestamp. Output order is by timestamp, then symbol, then the order
/// sources were given in.
pub fn merge_sources(sources: Vec<TickSeries>) -> Result<Vec<Tick>, SourceError> {
    let mut lanes: Vec<std::vec::IntoIter<Tick>> = Vec::new();
    let mut total = 0;
    for source in sources {
        total += source.len();
        for lane in split_lanes(source)? {
            lanes.push(lane.into_iter());
        }
    }

    type Key = Reverse<(DateTime<Utc>, String, usize)>;
    let mut heads: Vec<Option<Tick>> = lanes.iter_mut().map(Iterator::next).collect();
    let mut heap: BinaryHeap<Key> = heads
        .iter()
        .enumerate()
        .filter_map(|(i, head)| {
            head.as_ref()
                .map(|t| Reverse((t.timestamp, t.symbol.clone(), i)))
        })
        .collect();

    let mut merged = Vec::with_capacity(total);
    while let Some(Reverse((_, _, lane))) = heap.pop() {
        let Some(tick) = heads[lane].take() else {
            continue;
        };
        merged.push(tick);
        if let Some(next) = lanes[lane].next() {
            heap.push(Reverse((next.timestamp, next.symbol.clone(), lane)));
            heads[lane] = Some(next);
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 14, 30, 0).unwrap() + Duration::minutes(minute)
    }

    fn make_tick(symbol: &str, minute: i64, close: f64) -> Tick {
        Tick {
            symbol: symbol.into(),
            timestamp: t(minute),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    fn keys(ticks: &[Tick]) -> Vec<(String, i64)> {
        ticks
            .iter()
            .map(|tk| (tk.symbol.clone(), (tk.timestamp - t(0)).num_minutes()))
            .collect()
    }

    #[test]
    fn merges_by_time_then_symbol() {
        let stocks = TickSeries::new(
            "stocks",
            vec![
                make_tick("MSFT", 0, 1.0),
                make_tick("AAPL", 1, 1.0),
                make_tick("MSFT", 2, 1.0),
            ],
        );
        let crypto = TickSeries::new(
            "crypto",
            vec![make_tick("BTC/USD", 0, 1.0), make_tick("BTC/USD", 1, 1.0)],
        );
        let merged = merge_sources(vec![stocks, crypto]).unwrap();
        assert_eq!(
            keys(&merged),
            vec![
                ("BTC/USD".to_string(), 0),
                ("MSFT".to_string(), 0),
                ("AAPL".to_string(), 1),
                ("BTC/USD".to_string(), 1),
                ("MSFT".to_string(), 2),
            ]
        );
    }

    #[test]
    fn source_order_does_not_matter_for_distinct_symbols() {
        let a = TickSeries::new("a", vec![make_tick("A", 0, 1.0), make_tick("A", 3, 1.0)]);
        let b = TickSeries::new("b", vec![make_tick("B", 0, 1.0), make_tick("B", 1, 1.0)]);
        let ab = merge_sources(vec![a.clone(), b.clone()]).unwrap();
        let ba = merge_sources(vec![b, a]).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn per_symbol_blocks_within_one_source() {
        let source = TickSeries::new(
            "bulk",
            vec![
                make_tick("X", 0, 1.0),
                make_tick("X", 2, 1.0),
                make_tick("Y", 1, 1.0),
                make_tick("Y", 3, 1.0),
            ],
        );
        let merged = merge_sources(vec![source]).unwrap();
        assert_eq!(
            keys(&merged),
            vec![
                ("X".to_string(), 0),
                ("Y".to_string(), 1),
                ("X".to_string(), 2),
                ("Y".to_string(), 3),
            ]
        );
    }

    #[test]
    fn non_monotonic_source_fails() {
        let source = TickSeries::new(
            "feed",
            vec![make_tick("AAPL", 2, 1.0), make_tick("AAPL", 2, 1.0)],
        );
        let err = merge_sources(vec![source]).unwrap_err();
        assert!(matches!(
            err,
            SourceError::NonMonotonic { ref source_name, ref symbol, .. }
                if source_name == "feed" && symbol == "AAPL"
        ));
    }

    #[test]
    fn empty_sources() {
        assert!(merge_sources(vec![]).unwrap().is_empty());
        assert!(merge_sources(vec![TickSeries::default()]).unwrap().is_empty());
    }
}
