use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after successful state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ItemCreated {
        item_id: Uuid,
        name: String,
    },
    ItemDeleted {
        item_id: Uuid,
    },
    StockAdjusted {
        item_id: Uuid,
        movement_id: Uuid,
        delta: i32,
        new_quantity: i32,
        reason: String,
    },
    LowStock {
        item_id: Uuid,
        name: String,
        quantity: i32,
        restock_level: i32,
    },
    SaleRecorded {
        sale_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    },
    SaleReturned {
        sale_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        full_return: bool,
    },
    OutgoingRecorded {
        record_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    },
    UserRegistered {
        user_id: Uuid,
        username: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. Event delivery is best-effort and
    /// never affects the outcome of the transaction that produced it: a
    /// closed or full channel is logged and swallowed.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Failed to publish event: {}", e);
        }
    }
}

/// Consumes events off the channel and logs them. Runs for the lifetime of
/// the process; exits when all senders are dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::LowStock {
                item_id,
                name,
                quantity,
                restock_level,
            } => {
                warn!(
                    item_id = %item_id,
                    item = %name,
                    quantity,
                    restock_level,
                    "Item at or below restock level"
                );
            }
            other => {
                info!(event = ?other, "Processing event");
            }
        }
    }
    info!("Event channel closed; event processor exiting");
}
