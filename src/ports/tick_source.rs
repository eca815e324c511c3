//! Live tick source port.

use crate::domain::error::SourceError;
use crate::domain::tick::Tick;

/// An unbounded, push-style tick feed consumed by the streaming driver.
///
/// Implementations must deliver each symbol's ticks in strictly increasing
/// timestamp order. Reconnects and backoff are the source's own business;
/// an `Err` ends the run.
#[async_trait::async_trait]
pub trait LiveTickSource: Send {
    fn name(&self) -> &str;

    /// Wait for the next tick. `None` means the feed has ended cleanly.
    async fn next_tick(&mut self) -> Option<Result<Tick, SourceError>>;
}
