//! Execution venue port.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::VenueError;
use crate::domain::execution::{OrderRequest, OrderSide};

/// The venue accepted an order for working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub client_order_id: String,
    pub venue_order_id: String,
}

/// Asynchronous fill notification for a previously acknowledged order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    pub client_order_id: String,
    pub venue_order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub filled_quantity: f64,
    pub filled_price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Order placement. Fills arrive later on a channel the venue hands out
/// when it is built, never as the result of `place_order`.
pub trait ExecutionVenue: Send {
    fn name(&self) -> &str;

    fn place_order(&mut self, order: &OrderRequest) -> Result<OrderAck, VenueError>;
}
