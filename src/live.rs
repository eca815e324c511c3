//! Streaming drive mode.
//!
//! Every live source runs as its own task and forwards into one bounded
//! intake queue. [`LiveEngine::run`] is the single consumer: it pulls ticks
//! in arrival order and hands each one to the same [`Engine::process_tick`]
//! that replay uses, so portfolio, windows and ledger are only ever touched
//! from one place. Orders go to the venue fire-and-forget; fills come back
//! on a separate channel and are reconciled against what the engine assumed.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::domain::config::EngineConfig;
use crate::domain::engine::{Engine, TickOutcome};
use crate::domain::error::{RevtraderError, SourceError};
use crate::domain::execution::OrderRequest;
use crate::domain::ledger::FillRecord;
use crate::domain::metrics::RunSummary;
use crate::domain::tick::Tick;
use crate::ports::tick_source::LiveTickSource;
use crate::ports::venue::{ExecutionVenue, FillReport};

enum SourceEvent {
    Tick(Tick),
    Failed(SourceError),
    Finished(String),
}

/// Requests a clean stop of a running [`LiveEngine`]. Cheap to clone.
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// The tick being processed completes; no further ticks are taken.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct LiveEngine {
    engine: Engine,
    intake_tx: mpsc::Sender<SourceEvent>,
    intake_rx: mpsc::Receiver<SourceEvent>,
    sources: JoinSet<()>,
    active_sources: usize,
    stop_tx: Arc<watch::Sender<bool>>,
    venue: Option<Box<dyn ExecutionVenue>>,
    fills: Option<mpsc::Receiver<FillReport>>,
    pending: HashMap<String, OrderRequest>,
}

impl LiveEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let (intake_tx, intake_rx) = mpsc::channel(config.intake_capacity.max(1));
        let (stop_tx, _) = watch::channel(false);
        LiveEngine {
            engine: Engine::new(config),
            intake_tx,
            intake_rx,
            sources: JoinSet::new(),
            active_sources: 0,
            stop_tx: Arc::new(stop_tx),
            venue: None,
            fills: None,
            pending: HashMap::new(),
        }
    }

    /// Route orders to `venue` and reconcile the fills it reports on `fills`.
    pub fn with_venue(
        mut self,
        venue: Box<dyn ExecutionVenue>,
        fills: mpsc::Receiver<FillReport>,
    ) -> Self {
        self.venue = Some(venue);
        self.fills = Some(fills);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Acknowledged orders still waiting for a fill.
    pub fn pending_orders(&self) -> usize {
        self.pending.len()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: Arc::clone(&self.stop_tx),
        }
    }

    /// Start a task that forwards `source` into the intake queue until the
    /// source ends, fails, or a stop is requested. Must be called from
    /// within a tokio runtime.
    pub fn spawn_source<S>(&mut self, mut source: S)
    where
        S: LiveTickSource + 'static,
    {
        let tx = self.intake_tx.clone();
        let mut stop_rx = self.stop_tx.subscribe();
        let name = source.name().to_string();
        self.active_sources += 1;
        info!(source = %name, "source attached");

        self.sources.spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    item = source.next_tick() => {
                        let event = match item {
                            Some(Ok(tick)) => SourceEvent::Tick(tick),
                            Some(Err(err)) => SourceEvent::Failed(err),
                            None => SourceEvent::Finished(name.clone()),
                        };
                        let last = !matches!(event, SourceEvent::Tick(_));
                        if tx.send(event).await.is_err() || last {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Consume the intake until every source has finished, a stop is
    /// requested, or a source fails.
    ///
    /// A stop or the end of all sources returns the summary with positions
    /// left open. A source failure or engine desync is returned as an error.
    pub async fn run(&mut self) -> Result<RunSummary, RevtraderError> {
        let mut stop_rx = self.stop_tx.subscribe();
        info!(sources = self.active_sources, "streaming started");

        let result = loop {
            if *stop_rx.borrow_and_update() {
                info!("stop requested");
                break Ok(());
            }
            if self.active_sources == 0 {
                info!("all sources finished");
                break Ok(());
            }

            tokio::select! {
                biased;
                _ = stop_rx.changed() => continue,
                fill = next_fill(&mut self.fills) => match fill {
                    Some(report) => self.reconcile(report),
                    None => {
                        warn!(
                            dropped_orders = self.pending.len(),
                            "venue fill channel closed, no longer tracking fills"
                        );
                        self.pending.clear();
                        self.fills = None;
                    }
                },
                event = self.intake_rx.recv() => match event {
                    Some(SourceEvent::Tick(tick)) => {
                        if let Err(err) = self.handle_tick(tick) {
                            break Err(err);
                        }
                    }
                    Some(SourceEvent::Failed(err)) => {
                        error!(error = %err, "tick source failed");
                        break Err(RevtraderError::Source(err));
                    }
                    Some(SourceEvent::Finished(name)) => {
                        info!(source = %name, "source finished");
                        self.active_sources -= 1;
                    }
                    // The engine holds a sender, so the intake never closes.
                    None => break Ok(()),
                },
            }
        };

        self.sources.abort_all();
        self.active_sources = 0;
        self.drain_fills();

        let summary = self.engine.summary();
        info!(
            processed = summary.ticks_processed,
            rejected = summary.ticks_rejected,
            trades = summary.trade_count,
            open_positions = summary.open_positions,
            equity = summary.final_equity,
            "streaming stopped"
        );
        result.map(|()| summary)
    }

    fn handle_tick(&mut self, tick: Tick) -> Result<(), RevtraderError> {
        let outcome = self.engine.process_tick(tick)?;
        if let TickOutcome::Processed(processed) = outcome
            && let Some(order) = processed.order
        {
            self.submit(order);
        }
        Ok(())
    }

    fn submit(&mut self, order: OrderRequest) {
        let Some(venue) = self.venue.as_mut() else {
            debug!(client_order_id = %order.client_order_id, "no venue attached, order not sent");
            return;
        };
        match venue.place_order(&order) {
            Ok(ack) => {
                info!(
                    venue = venue.name(),
                    client_order_id = %ack.client_order_id,
                    venue_order_id = %ack.venue_order_id,
                    symbol = %order.symbol,
                    side = %order.side,
                    quantity = order.quantity,
                    "order acknowledged"
                );
                if self.fills.is_some() {
                    self.pending.insert(order.client_order_id.clone(), order);
                }
            }
            Err(err) => {
                warn!(
                    venue = venue.name(),
                    client_order_id = %order.client_order_id,
                    error = %err,
                    "order rejected by venue"
                );
                let reason = err.to_string();
                self.engine.record_order_rejection(order, reason);
            }
        }
    }

    fn reconcile(&mut self, report: FillReport) {
        let Some(order) = self.pending.remove(&report.client_order_id) else {
            warn!(client_order_id = %report.client_order_id, "fill for unknown order");
            return;
        };
        let record = FillRecord {
            client_order_id: report.client_order_id,
            venue_order_id: report.venue_order_id,
            symbol: report.symbol,
            side: report.side,
            assumed_price: order.reference_price,
            assumed_quantity: order.quantity,
            filled_price: report.filled_price,
            filled_quantity: report.filled_quantity,
            timestamp: report.timestamp,
        };
        if record.matches_assumed() {
            debug!(client_order_id = %record.client_order_id, "fill matches assumed");
        } else {
            warn!(
                client_order_id = %record.client_order_id,
                symbol = %record.symbol,
                slippage = record.price_slippage(),
                shortfall = record.quantity_shortfall(),
                "fill differs from assumed"
            );
        }
        self.engine.record_fill(record);
    }

    fn drain_fills(&mut self) {
        let mut ready = Vec::new();
        if let Some(rx) = self.fills.as_mut() {
            while let Ok(report) = rx.try_recv() {
                ready.push(report);
            }
        }
        for report in ready {
            self.reconcile(report);
        }
    }
}

async fn next_fill(fills: &mut Option<mpsc::Receiver<FillReport>>) -> Option<FillReport> {
    match fills {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
