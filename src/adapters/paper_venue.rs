//! Paper execution venue: acknowledges every order and fills it in full at
//! the reference price.

use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::error::VenueError;
use crate::domain::execution::OrderRequest;
use crate::ports::venue::{ExecutionVenue, FillReport, OrderAck};

pub struct PaperVenue {
    fills: mpsc::Sender<FillReport>,
    next_id: u64,
    /// Price offset applied to every fill, to exercise reconciliation.
    slippage: f64,
}

impl PaperVenue {
    /// Build the venue and the receiver its fills are delivered on.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<FillReport>) {
        let (fills, rx) = mpsc::channel(capacity.max(1));
        (
            PaperVenue {
                fills,
                next_id: 0,
                slippage: 0.0,
            },
            rx,
        )
    }

    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage = slippage;
        self
    }
}

impl ExecutionVenue for PaperVenue {
    fn name(&self) -> &str {
        "paper"
    }

    fn place_order(&mut self, order: &OrderRequest) -> Result<OrderAck, VenueError> {
        let valid_quantity = order.quantity.is_finite() && order.quantity > 0.0;
        if !valid_quantity || !order.reference_price.is_finite() {
            return Err(VenueError::Rejected {
                client_order_id: order.client_order_id.clone(),
                reason: "quantity must be positive and price finite".to_string(),
            });
        }

        self.next_id += 1;
        let venue_order_id = format!("paper-{}", self.next_id);
        let fill = FillReport {
            client_order_id: order.client_order_id.clone(),
            venue_order_id: venue_order_id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            filled_quantity: order.quantity,
            filled_price: order.reference_price + self.slippage,
            timestamp: order.timestamp,
        };
        if let Err(err) = self.fills.try_send(fill) {
            warn!(client_order_id = %order.client_order_id, error = %err, "paper fill dropped");
            return Err(VenueError::Unavailable {
                reason: "fill queue full or closed".to_string(),
            });
        }

        Ok(OrderAck {
            client_order_id: order.client_order_id.clone(),
            venue_order_id,
        })
    }
}
