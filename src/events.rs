use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::OperationType;

/// Events emitted after successful mutations. Delivery is best-effort:
/// a failed send is logged and never fails the mutation that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockAdjusted {
        product_id: Uuid,
        location_id: Uuid,
        previous_quantity: i64,
        new_quantity: i64,
        delta: i64,
        operation: OperationType,
    },
    TransferCreated(Uuid),
    TransferConfirmed(Uuid),
    TransferCancelled(Uuid),
    SaleCreated(Uuid),
    SaleUpdated(Uuid),
    SaleDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {e}"))
    }

    /// Sends an event, downgrading failure to a warning. Used on paths where
    /// the primary mutation has already committed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!(%err, "event delivery failed; ledger state unaffected");
        }
    }
}

/// Drains the event channel and logs each event. Runs for the lifetime of
/// the process.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "event processed");
    }
}
