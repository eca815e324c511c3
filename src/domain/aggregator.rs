//! Quorum voting over the per-strategy signals for one (symbol, timestamp).

use crate::domain::position::PositionSide;
use crate::domain::signal::{Action, Decision, Direction, Signal};

/// BUY and SELL counts among a set of signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub buy: usize,
    pub sell: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteAggregator {
    quorum: usize,
}

impl VoteAggregator {
    /// A quorum of zero is raised to one so HOLD-only rounds never trade.
    pub fn new(quorum: usize) -> Self {
        VoteAggregator {
            quorum: quorum.max(1),
        }
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn tally(signals: &[Signal]) -> VoteTally {
        signals
            .iter()
            .fold(VoteTally::default(), |mut t, s| {
                match s.direction {
                    Direction::Buy => t.buy += 1,
                    Direction::Sell => t.sell += 1,
                    Direction::Hold => {}
                }
                t
            })
    }

    /// Resolve the signals for one symbol into a decision.
    ///
    /// `signals` must all share `symbol` and `timestamp`. Equal BUY and SELL
    /// counts resolve to HOLD. Closing needs only the quorum on the exit
    /// side; opening also needs that side to outvote the other.
    pub fn decide(
        &self,
        symbol: &str,
        timestamp: chrono::DateTime<chrono::Utc>,
        signals: &[Signal],
        side: PositionSide,
        shorting_allowed: bool,
    ) -> Decision {
        let tally = Self::tally(signals);
        let tied = tally.buy == tally.sell;
        let buy_quorum = tally.buy >= self.quorum && !tied;
        let sell_quorum = tally.sell >= self.quorum && !tied;

        let action = match side {
            PositionSide::Flat if buy_quorum && tally.buy > tally.sell => Action::OpenLong,
            PositionSide::Flat if sell_quorum && tally.sell > tally.buy && shorting_allowed => {
                Action::OpenShort
            }
            PositionSide::Long if sell_quorum => Action::Close,
            PositionSide::Short if buy_quorum => Action::Close,
            _ => Action::Hold,
        };

        Decision {
            symbol: symbol.to_string(),
            timestamp,
            action,
        }
    }
}
