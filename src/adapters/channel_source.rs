//! In-process live tick sources.
//!
//! [`ChannelTickSource`] wraps the receiving end of a tokio channel, so any
//! feed task (websocket reader, simulator) can push ticks into the engine.
//! [`VecTickSource`] plays back a fixed script, optionally paced, and is what
//! the streaming tests drive.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::domain::error::SourceError;
use crate::domain::tick::Tick;
use crate::ports::tick_source::LiveTickSource;

pub struct ChannelTickSource {
    name: String,
    rx: mpsc::Receiver<Result<Tick, SourceError>>,
}

impl ChannelTickSource {
    pub fn new(name: impl Into<String>, rx: mpsc::Receiver<Result<Tick, SourceError>>) -> Self {
        ChannelTickSource {
            name: name.into(),
            rx,
        }
    }

    /// A source plus the sender a feed task writes into. Dropping every
    /// sender ends the source.
    pub fn channel(
        name: impl Into<String>,
        capacity: usize,
    ) -> (mpsc::Sender<Result<Tick, SourceError>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, ChannelTickSource::new(name, rx))
    }
}

#[async_trait::async_trait]
impl LiveTickSource for ChannelTickSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_tick(&mut self) -> Option<Result<Tick, SourceError>> {
        self.rx.recv().await
    }
}

pub struct VecTickSource {
    name: String,
    items: VecDeque<Result<Tick, SourceError>>,
    pace: Option<Duration>,
    hold_open: bool,
}

impl VecTickSource {
    pub fn new(name: impl Into<String>, ticks: Vec<Tick>) -> Self {
        Self::from_results(name, ticks.into_iter().map(Ok).collect())
    }

    /// Script that may include errors, delivered in order.
    pub fn from_results(name: impl Into<String>, items: Vec<Result<Tick, SourceError>>) -> Self {
        VecTickSource {
            name: name.into(),
            items: items.into(),
            pace: None,
            hold_open: false,
        }
    }

    /// Sleep this long before each item.
    pub fn paced(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    /// Stay connected but silent after the script runs out, like an idle feed.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

#[async_trait::async_trait]
impl LiveTickSource for VecTickSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_tick(&mut self) -> Option<Result<Tick, SourceError>> {
        if let Some(pace) = self.pace {
            tokio::time::sleep(pace).await;
        }
        match self.items.pop_front() {
            Some(item) => Some(item),
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }
}
