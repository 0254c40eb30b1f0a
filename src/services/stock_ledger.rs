use std::time::Duration;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{HistoryEntry, OperationType, StockLevel};
use crate::services::history::HistoryRecorder;
use crate::store::{with_timeout, SharedStore};

/// Who and why behind a ledger mutation; carried into the movement history.
#[derive(Debug, Clone)]
pub struct AdjustContext {
    pub operation: OperationType,
    pub actor: Option<String>,
    pub note: Option<String>,
}

impl AdjustContext {
    pub fn new(operation: OperationType) -> Self {
        Self {
            operation,
            actor: None,
            note: None,
        }
    }

    pub fn with_note(operation: OperationType, note: impl Into<String>) -> Self {
        Self {
            operation,
            actor: None,
            note: Some(note.into()),
        }
    }
}

/// Owner of the per-(product, location) quantities and of the single
/// non-negativity invariant. All mutation passes through [`adjust`];
/// the ledger has no notion of "move", only of debit and credit, so
/// composite correctness across two keys belongs to the orchestrators.
///
/// [`adjust`]: StockLedger::adjust
#[derive(Clone)]
pub struct StockLedger {
    store: SharedStore,
    history: HistoryRecorder,
    event_sender: EventSender,
    store_timeout: Duration,
}

impl StockLedger {
    pub fn new(
        store: SharedStore,
        history: HistoryRecorder,
        event_sender: EventSender,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            history,
            event_sender,
            store_timeout,
        }
    }

    /// Current quantity for the key; 0 when no row exists.
    #[instrument(skip(self))]
    pub async fn get(&self, product_id: Uuid, location_id: Uuid) -> Result<i64, ServiceError> {
        let quantity = with_timeout(
            self.store_timeout,
            self.store.get_stock_level(product_id, location_id),
        )
        .await?;
        Ok(quantity)
    }

    /// Applies `delta` (positive or negative) and returns the new quantity.
    /// A result below zero is rejected with `NegativeStockResult` and no
    /// mutation occurs; the store enforces this atomically per key even when
    /// a caller skipped its pre-check.
    #[instrument(skip(self, context), fields(operation = %context.operation))]
    pub async fn adjust(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        delta: i64,
        context: AdjustContext,
    ) -> Result<i64, ServiceError> {
        let new_quantity = with_timeout(
            self.store_timeout,
            self.store.adjust_stock(product_id, location_id, delta),
        )
        .await?;
        let previous_quantity = new_quantity - delta;

        self.history.record(HistoryEntry::new(
            product_id,
            location_id,
            previous_quantity,
            new_quantity,
            context.operation,
            context.actor,
            context.note,
        ));

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                product_id,
                location_id,
                previous_quantity,
                new_quantity,
                delta,
                operation: context.operation,
            })
            .await;

        info!(
            %product_id,
            %location_id,
            delta,
            new_quantity,
            operation = %context.operation,
            "stock adjusted"
        );
        Ok(new_quantity)
    }

    /// All known stock rows, optionally filtered by location.
    #[instrument(skip(self))]
    pub async fn list(&self, location_id: Option<Uuid>) -> Result<Vec<StockLevel>, ServiceError> {
        let levels = with_timeout(self.store_timeout, self.store.list_stock_levels(location_id))
            .await?;
        Ok(levels)
    }

    /// Movement history for diagnostics; may lag behind the ledger or miss
    /// entries lost to recorder failures.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        product_id: Option<Uuid>,
        location_id: Option<Uuid>,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        let entries = with_timeout(
            self.store_timeout,
            self.store.list_history(product_id, location_id),
        )
        .await?;
        Ok(entries)
    }
}
