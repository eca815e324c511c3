//! Bounded per-symbol tick buffer fed to strategies.

use std::collections::VecDeque;

use crate::domain::tick::Tick;

/// The N most recent ticks for one symbol, oldest first.
///
/// A window always holds at least one tick: it is created from the first
/// tick seen for its symbol.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    ticks: VecDeque<Tick>,
}

impl RollingWindow {
    pub fn new(capacity: usize, first: Tick) -> Self {
        let capacity = capacity.max(1);
        let mut ticks = VecDeque::with_capacity(capacity);
        ticks.push_back(first);
        RollingWindow { capacity, ticks }
    }

    pub fn symbol(&self) -> &str {
        &self.latest().symbol
    }

    pub fn push(&mut self, tick: Tick) {
        if self.ticks.len() == self.capacity {
            self.ticks.pop_front();
        }
        self.ticks.push_back(tick);
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.ticks.len() == self.capacity
    }

    pub fn latest(&self) -> &Tick {
        // Never empty: seeded on construction and push evicts before appending.
        &self.ticks[self.ticks.len() - 1]
    }

    /// Closing prices of the last `n` ticks, oldest first.
    /// `None` until at least `n` ticks have been pushed.
    pub fn closes(&self, n: usize) -> Option<Vec<f64>> {
        if n == 0 || self.ticks.len() < n {
            return None;
        }
        Some(
            self.ticks
                .iter()
                .skip(self.ticks.len() - n)
                .map(|t| t.close)
                .collect(),
        )
    }
}
