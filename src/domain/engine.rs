//! The shared per-tick pipeline and the replay drive mode.
//!
//! [`Engine::process_tick`] is the only way a tick reaches strategies,
//! the aggregator and the portfolio. Replay feeds it a merged finite
//! sequence; the streaming driver feeds it ticks in arrival order. Given the
//! same ticks in the same order both produce the same decisions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::domain::aggregator::VoteAggregator;
use crate::domain::asset::{AssetClassifier, ShortingPolicy};
use crate::domain::config::EngineConfig;
use crate::domain::error::{PortfolioError, RevtraderError, TickError};
use crate::domain::execution::OrderRequest;
use crate::domain::ledger::{FillRecord, Ledger};
use crate::domain::metrics::{RunCounters, RunSummary};
use crate::domain::portfolio::{Applied, Portfolio};
use crate::domain::position::Trade;
use crate::domain::signal::{Decision, Signal};
use crate::domain::strategy::{Strategy, build_strategies};
use crate::domain::tick::Tick;
use crate::domain::timeline::{TickSeries, merge_sources};
use crate::domain::window::RollingWindow;

/// What the pipeline did with one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tick failed validation and never reached the strategies.
    Rejected(TickError),
    Processed(ProcessedTick),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTick {
    pub signals: Vec<Signal>,
    /// The decision as applied. An open the portfolio refused shows as HOLD.
    pub decision: Decision,
    pub trade: Option<Trade>,
    pub order: Option<OrderRequest>,
}

impl TickOutcome {
    pub fn decision(&self) -> Option<&Decision> {
        match self {
            TickOutcome::Processed(p) => Some(&p.decision),
            TickOutcome::Rejected(_) => None,
        }
    }

    pub fn trade(&self) -> Option<&Trade> {
        match self {
            TickOutcome::Processed(p) => p.trade.as_ref(),
            TickOutcome::Rejected(_) => None,
        }
    }

    pub fn order(&self) -> Option<&OrderRequest> {
        match self {
            TickOutcome::Processed(p) => p.order.as_ref(),
            TickOutcome::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TickOutcome::Rejected(_))
    }
}

pub struct Engine {
    strategies: Vec<Box<dyn Strategy>>,
    aggregator: VoteAggregator,
    portfolio: Portfolio,
    ledger: Ledger,
    windows: HashMap<String, RollingWindow>,
    window_capacity: usize,
    shorting: ShortingPolicy,
    classifier: AssetClassifier,
    snapshot_interval: u64,
    close_on_finish: bool,
    counters: RunCounters,
    next_order_id: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        let strategies = build_strategies(&config.strategies);
        let window_capacity = strategies
            .iter()
            .map(|s| s.lookback())
            .max()
            .unwrap_or(1);
        Engine {
            strategies,
            aggregator: VoteAggregator::new(config.quorum),
            portfolio: Portfolio::new(config.initial_cash, config.sizer),
            ledger: Ledger::new(),
            windows: HashMap::new(),
            window_capacity,
            shorting: config.shorting,
            classifier: config.classifier.clone(),
            snapshot_interval: config.snapshot_interval.max(1) as u64,
            close_on_finish: config.close_on_finish,
            counters: RunCounters::default(),
            next_order_id: 0,
            last_timestamp: None,
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    pub fn strategy_ids(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    /// Run one tick through strategies, aggregator and portfolio.
    ///
    /// Malformed or stale ticks are counted and returned as `Rejected`.
    /// An open the portfolio cannot fund becomes HOLD. The only error is a
    /// desync between aggregator and portfolio, which is fatal.
    pub fn process_tick(&mut self, tick: Tick) -> Result<TickOutcome, RevtraderError> {
        if let Err(err) = self.check_tick(&tick) {
            warn!(error = %err, "rejecting tick");
            self.counters.ticks_rejected += 1;
            return Ok(TickOutcome::Rejected(err));
        }

        let capacity = self.window_capacity;
        self.windows
            .entry(tick.symbol.clone())
            .and_modify(|w| w.push(tick.clone()))
            .or_insert_with(|| RollingWindow::new(capacity, tick.clone()));
        let window = &self.windows[&tick.symbol];

        self.portfolio.mark_to_market(&tick);
        let signals: Vec<Signal> = self.strategies.iter().map(|s| s.evaluate(window)).collect();

        let class = self.classifier.classify(&tick.symbol);
        let side = self.portfolio.position_side(&tick.symbol);
        let mut decision = self.aggregator.decide(
            &tick.symbol,
            tick.timestamp,
            &signals,
            side,
            self.shorting.allows(class),
        );

        let mut trade = None;
        let mut order = None;
        match self.portfolio.apply(&decision, &tick, class) {
            Ok(Applied::Held) => {}
            Ok(Applied::Opened(position)) => {
                info!(
                    symbol = %position.symbol,
                    side = %position.side,
                    quantity = position.quantity,
                    price = position.entry_price,
                    cash = self.portfolio.cash(),
                    "opened position"
                );
                order = Some(OrderRequest::for_open(self.next_client_order_id(), &position));
            }
            Ok(Applied::Closed(closed)) => {
                info!(
                    symbol = %closed.symbol,
                    side = %closed.side,
                    quantity = closed.quantity,
                    entry = closed.entry_price,
                    exit = closed.exit_price,
                    pnl = closed.realized_pnl,
                    cash = self.portfolio.cash(),
                    "closed position"
                );
                order = Some(OrderRequest::for_close(self.next_client_order_id(), &closed));
                self.ledger.record_trade(closed.clone());
                trade = Some(closed);
            }
            Err(
                err @ (PortfolioError::InsufficientCash { .. }
                | PortfolioError::ZeroQuantity { .. }),
            ) => {
                warn!(error = %err, action = %decision.action, "open refused, holding");
                decision = Decision::hold(&tick.symbol, tick.timestamp);
            }
            Err(err @ PortfolioError::InvalidTransition { .. }) => {
                error!(error = %err, "aggregator and portfolio disagree");
                return Err(RevtraderError::Desync(err));
            }
        }

        self.counters.ticks_processed += 1;
        self.last_timestamp = Some(tick.timestamp);
        if self.counters.ticks_processed % self.snapshot_interval == 0 {
            self.ledger.record_cash_snapshot(
                tick.timestamp,
                self.portfolio.cash(),
                self.portfolio.equity(),
            );
        }
        debug!(
            symbol = %tick.symbol,
            timestamp = %tick.timestamp,
            action = %decision.action,
            "tick processed"
        );

        Ok(TickOutcome::Processed(ProcessedTick {
            signals,
            decision,
            trade,
            order,
        }))
    }

    fn check_tick(&self, tick: &Tick) -> Result<(), TickError> {
        tick.validate()?;
        if let Some(window) = self.windows.get(&tick.symbol) {
            let previous = window.latest().timestamp;
            if tick.timestamp <= previous {
                return Err(TickError::NotAfterPrevious {
                    symbol: tick.symbol.clone(),
                    timestamp: tick.timestamp,
                    previous,
                });
            }
        }
        Ok(())
    }

    fn next_client_order_id(&mut self) -> String {
        self.next_order_id += 1;
        format!("rt-{:06}", self.next_order_id)
    }

    /// Merge finite sources, process every tick in order, then finish.
    pub fn replay(&mut self, sources: Vec<TickSeries>) -> Result<RunSummary, RevtraderError> {
        let source_count = sources.len();
        let ticks = merge_sources(sources)?;
        info!(sources = source_count, ticks = ticks.len(), "replay started");

        for tick in ticks {
            self.process_tick(tick)?;
        }

        let liquidated = if self.close_on_finish {
            self.finish().len()
        } else {
            0
        };
        let summary = self.summary();
        info!(
            processed = summary.ticks_processed,
            rejected = summary.ticks_rejected,
            trades = summary.trade_count,
            liquidated,
            equity = summary.final_equity,
            "replay finished"
        );
        Ok(summary)
    }

    /// Close all open positions at their last prices and record the trades.
    pub fn finish(&mut self) -> Vec<Trade> {
        let trades = self.portfolio.close_all();
        for trade in &trades {
            info!(
                symbol = %trade.symbol,
                exit = trade.exit_price,
                pnl = trade.realized_pnl,
                "liquidated at end of run"
            );
            self.ledger.record_trade(trade.clone());
        }
        if !trades.is_empty()
            && let Some(timestamp) = self.last_timestamp
        {
            self.ledger.record_cash_snapshot(
                timestamp,
                self.portfolio.cash(),
                self.portfolio.equity(),
            );
        }
        trades
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::compute(&self.portfolio, &self.ledger, self.counters)
    }

    pub fn record_fill(&mut self, fill: FillRecord) {
        self.ledger.record_fill(fill);
    }

    pub fn record_order_rejection(&mut self, order: OrderRequest, reason: impl Into<String>) {
        self.counters.orders_rejected += 1;
        self.ledger.record_order_rejection(order, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{Sizer, SizingPolicy};
    use crate::domain::position::PositionSide;
    use crate::domain::signal::Action;
    use crate::domain::strategy::StrategySpec;
    use chrono::{Duration, TimeZone};

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 13, 30, 0).unwrap() + Duration::minutes(minute)
    }

    fn make_tick(symbol: &str, minute: i64, close: f64) -> Tick {
        Tick {
            symbol: symbol.into(),
            timestamp: t(minute),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    /// Two fast RSI voters so a quorum of 2 trades on short swings.
    fn make_config() -> EngineConfig {
        EngineConfig {
            initial_cash: 10_000.0,
            quorum: 2,
            sizer: Sizer {
                policy: SizingPolicy::FixedNotional(1_000.0),
                crypto_decimals: 6,
            },
            strategies: vec![
                StrategySpec::Rsi {
                    period: 2,
                    oversold: 20.0,
                    overbought: 80.0,
                },
                StrategySpec::Rsi {
                    period: 2,
                    oversold: 30.0,
                    overbought: 70.0,
                },
                StrategySpec::Bollinger {
                    period: 50,
                    num_std: 2.0,
                },
            ],
            ..EngineConfig::default()
        }
    }

    fn run(engine: &mut Engine, symbol: &str, closes: &[f64]) -> Vec<TickOutcome> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| engine.process_tick(make_tick(symbol, i as i64, c)).unwrap())
            .collect()
    }

    #[test]
    fn window_sized_to_longest_lookback() {
        let engine = Engine::new(&make_config());
        assert_eq!(engine.window_capacity, 50);
        assert_eq!(engine.strategy_ids(), vec!["RSI(2)", "RSI(2)", "BOLLINGER(50,2)"]);
    }

    #[test]
    fn falling_then_rising_opens_and_closes_long() {
        let mut engine = Engine::new(&make_config());
        let outcomes = run(&mut engine, "AAPL", &[100.0, 99.0, 98.0, 100.0, 102.0]);
        assert_eq!(outcomes[2].decision().unwrap().action, Action::OpenLong);
        assert!(outcomes[2].order().is_some());
        assert_eq!(outcomes[4].decision().unwrap().action, Action::Close);

        let trade = outcomes[4].trade().unwrap();
        assert_eq!(trade.side, PositionSide::Long);
        // 1000 / 98 -> 10 units, 98 -> 102
        assert!((trade.quantity - 10.0).abs() < f64::EPSILON);
        assert!((trade.realized_pnl - 40.0).abs() < 1e-9);
        assert_eq!(engine.ledger().trades().len(), 1);
        assert_eq!(engine.portfolio().position_side("AAPL"), PositionSide::Flat);
    }

    #[test]
    fn crypto_never_opens_short() {
        let mut engine = Engine::new(&make_config());
        let outcomes = run(&mut engine, "BTC/USD", &[100.0, 101.0, 102.0, 103.0]);
        assert!(outcomes.iter().all(|o| o.decision().unwrap().is_hold()));

        let mut engine = Engine::new(&make_config());
        let outcomes = run(&mut engine, "AAPL", &[100.0, 101.0, 102.0, 103.0]);
        assert_eq!(outcomes[2].decision().unwrap().action, Action::OpenShort);
    }

    #[test]
    fn malformed_tick_rejected_and_pipeline_continues() {
        let mut engine = Engine::new(&make_config());
        let mut bad = make_tick("AAPL", 0, 100.0);
        bad.high = 90.0;
        let outcome = engine.process_tick(bad).unwrap();
        assert!(outcome.is_rejected());
        assert!(outcome.decision().is_none());

        let outcome = engine.process_tick(make_tick("AAPL", 1, 100.0)).unwrap();
        assert!(!outcome.is_rejected());
        assert_eq!(engine.counters().ticks_rejected, 1);
        assert_eq!(engine.counters().ticks_processed, 1);
    }

    #[test]
    fn stale_tick_rejected() {
        let mut engine = Engine::new(&make_config());
        engine.process_tick(make_tick("AAPL", 5, 100.0)).unwrap();
        let outcome = engine.process_tick(make_tick("AAPL", 5, 101.0)).unwrap();
        assert!(matches!(
            outcome,
            TickOutcome::Rejected(TickError::NotAfterPrevious { .. })
        ));
        // Other symbols are independent.
        assert!(!engine.process_tick(make_tick("MSFT", 1, 50.0)).unwrap().is_rejected());
    }

    #[test]
    fn unfunded_open_downgrades_to_hold() {
        let mut config = make_config();
        config.initial_cash = 500.0;
        let mut engine = Engine::new(&config);
        let outcomes = run(&mut engine, "AAPL", &[100.0, 99.0, 98.0]);
        let last = outcomes.last().unwrap();
        assert!(last.decision().unwrap().is_hold());
        assert!(last.order().is_none());
        assert_eq!(engine.portfolio().position_count(), 0);
        assert!((engine.portfolio().cash() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshots_follow_interval() {
        let mut config = make_config();
        config.snapshot_interval = 2;
        let mut engine = Engine::new(&config);
        run(&mut engine, "AAPL", &[100.0, 100.0, 100.0, 100.0, 100.0]);
        assert_eq!(engine.ledger().cash_history().len(), 2);
        assert_eq!(engine.ledger().cash_history()[1].timestamp, t(3));
    }

    #[test]
    fn replay_liquidates_on_finish() {
        let mut engine = Engine::new(&make_config());
        let series = TickSeries::new(
            "stocks",
            [100.0, 99.0, 98.0, 99.0]
                .iter()
                .enumerate()
                .map(|(i, &c)| make_tick("AAPL", i as i64, c))
                .collect(),
        );
        let summary = engine.replay(vec![series]).unwrap();
        assert_eq!(summary.trade_count, 1);
        assert_eq!(summary.open_positions, 0);
        let trade = &engine.ledger().trades()[0];
        assert_eq!(trade.exit_timestamp, t(3));
        assert!((trade.realized_pnl - 10.0).abs() < 1e-9);
    }

    #[test]
    fn replay_without_close_keeps_position() {
        let mut config = make_config();
        config.close_on_finish = false;
        let mut engine = Engine::new(&config);
        let series = TickSeries::new(
            "stocks",
            [100.0, 99.0, 98.0, 99.0]
                .iter()
                .enumerate()
                .map(|(i, &c)| make_tick("AAPL", i as i64, c))
                .collect(),
        );
        let summary = engine.replay(vec![series]).unwrap();
        assert_eq!(summary.trade_count, 0);
        assert_eq!(summary.open_positions, 1);
        assert!((summary.unrealized_pnl - 10.0).abs() < 1e-9);
    }

    #[test]
    fn replay_surfaces_source_errors() {
        let mut engine = Engine::new(&make_config());
        let series = TickSeries::new(
            "broken",
            vec![make_tick("AAPL", 2, 1.0), make_tick("AAPL", 1, 1.0)],
        );
        assert!(matches!(
            engine.replay(vec![series]),
            Err(RevtraderError::Source(_))
        ));
        assert_eq!(engine.counters().ticks_processed, 0);
    }

    #[test]
    fn order_ids_are_sequential() {
        let mut engine = Engine::new(&make_config());
        let outcomes = run(&mut engine, "AAPL", &[100.0, 99.0, 98.0, 100.0, 102.0]);
        let ids: Vec<&str> = outcomes
            .iter()
            .filter_map(|o| o.order())
            .map(|o| o.client_order_id.as_str())
            .collect();
        assert_eq!(ids, vec!["rt-000001", "rt-000002"]);
    }

    #[test]
    fn order_rejections_counted() {
        let mut engine = Engine::new(&make_config());
        let outcomes = run(&mut engine, "AAPL", &[100.0, 99.0, 98.0]);
        let order = outcomes[2].order().unwrap().clone();
        engine.record_order_rejection(order, "halted");
        assert_eq!(engine.summary().orders_rejected, 1);
        assert_eq!(engine.ledger().order_rejections().len(), 1);
    }
}
