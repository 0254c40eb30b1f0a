use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppliedAdjustment, ServiceError};
use crate::events::{Event, EventSender};
use crate::models::{OperationType, TransferItem, TransferOrder, TransferStatus};
use crate::services::stock_ledger::{AdjustContext, StockLedger};
use crate::services::validation;
use crate::store::{with_timeout, SharedStore};

/// Outcome of a cancellation request. `already_cancelled` distinguishes the
/// deterministic no-op on a terminal order from an actual state change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelResult {
    pub transfer: TransferOrder,
    pub already_cancelled: bool,
}

/// Drives the transfer lifecycle (`pending -> concluded -> cancelled`) by
/// invoking the stock ledger. The two legs of each item's movement are two
/// separate ledger calls with no cross-key atomicity: a mid-loop failure
/// stops processing and is surfaced as a partial-application error listing
/// what was already applied; nothing is rolled back.
#[derive(Clone)]
pub struct TransferService {
    store: SharedStore,
    ledger: Arc<StockLedger>,
    event_sender: EventSender,
    store_timeout: Duration,
}

impl TransferService {
    pub fn new(
        store: SharedStore,
        ledger: Arc<StockLedger>,
        event_sender: EventSender,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ledger,
            event_sender,
            store_timeout,
        }
    }

    /// Persists a `pending` transfer. No stock moves at creation: a transfer
    /// reserves nothing, it is a proposal. The availability check here is
    /// advisory only; confirmation re-validates.
    #[instrument(skip(self, items))]
    pub async fn create_transfer(
        &self,
        origin_location_id: Uuid,
        destination_location_id: Uuid,
        items: Vec<TransferItem>,
    ) -> Result<TransferOrder, ServiceError> {
        validation::ensure_transfer_shape(origin_location_id, destination_location_id, &items)?;
        for item in &items {
            validation::ensure_sufficient_stock(
                self.store.as_ref(),
                self.store_timeout,
                item.product_id,
                origin_location_id,
                item.quantity,
            )
            .await?;
        }

        let transfer = TransferOrder::new(origin_location_id, destination_location_id, items);
        with_timeout(self.store_timeout, self.store.insert_transfer(transfer.clone())).await?;

        self.event_sender
            .send_or_log(Event::TransferCreated(transfer.id))
            .await;
        info!(transfer_id = %transfer.id, %origin_location_id, %destination_location_id, "transfer created");
        Ok(transfer)
    }

    #[instrument(skip(self))]
    pub async fn get_transfer(&self, id: Uuid) -> Result<TransferOrder, ServiceError> {
        let transfer = with_timeout(self.store_timeout, self.store.get_transfer(id)).await?;
        Ok(transfer)
    }

    /// Applies the movement exactly once and concludes the order. Legal only
    /// from `pending`. Availability is re-validated per item first, since
    /// stock may have changed since creation; with zero adjustments applied
    /// an insufficiency leaves the order `pending` and stock untouched.
    #[instrument(skip(self))]
    pub async fn confirm_transfer(&self, id: Uuid) -> Result<TransferOrder, ServiceError> {
        let transfer = with_timeout(self.store_timeout, self.store.get_transfer(id)).await?;
        if transfer.status != TransferStatus::Pending {
            return Err(ServiceError::InvalidTransfer(format!(
                "transfer {id} cannot be confirmed from status {}",
                transfer.status
            )));
        }

        for item in &transfer.items {
            validation::ensure_sufficient_stock(
                self.store.as_ref(),
                self.store_timeout,
                item.product_id,
                transfer.origin_location_id,
                item.quantity,
            )
            .await?;
        }

        let mut applied: Vec<AppliedAdjustment> = Vec::new();
        for item in &transfer.items {
            self.apply_leg(
                &mut applied,
                "transfer_confirm",
                id,
                item.product_id,
                transfer.origin_location_id,
                -item.quantity,
                OperationType::TransferOut,
            )
            .await?;
            self.apply_leg(
                &mut applied,
                "transfer_confirm",
                id,
                item.product_id,
                transfer.destination_location_id,
                item.quantity,
                OperationType::TransferIn,
            )
            .await?;
        }

        let updated = with_timeout(
            self.store_timeout,
            self.store.update_transfer_status(id, TransferStatus::Concluded),
        )
        .await?;

        self.event_sender
            .send_or_log(Event::TransferConfirmed(id))
            .await;
        info!(transfer_id = %id, "transfer concluded");
        Ok(updated)
    }

    /// Cancels the order. From `pending` there is no stock effect. From
    /// `concluded` the movement is reversed exactly once; the reversal is
    /// always attempted, and the destination-side debit still honors the
    /// non-negativity invariant — it fails loudly, never clamps to zero.
    /// Cancelling an already-cancelled order is a deterministic no-op.
    #[instrument(skip(self))]
    pub async fn cancel_transfer(&self, id: Uuid) -> Result<CancelResult, ServiceError> {
        let transfer = with_timeout(self.store_timeout, self.store.get_transfer(id)).await?;

        match transfer.status {
            TransferStatus::Cancelled => {
                info!(transfer_id = %id, "transfer already cancelled; no reversal re-applied");
                Ok(CancelResult {
                    transfer,
                    already_cancelled: true,
                })
            }
            TransferStatus::Pending => {
                let updated = with_timeout(
                    self.store_timeout,
                    self.store.update_transfer_status(id, TransferStatus::Cancelled),
                )
                .await?;
                self.event_sender
                    .send_or_log(Event::TransferCancelled(id))
                    .await;
                info!(transfer_id = %id, "pending transfer cancelled; stock untouched");
                Ok(CancelResult {
                    transfer: updated,
                    already_cancelled: false,
                })
            }
            TransferStatus::Concluded => {
                let mut applied: Vec<AppliedAdjustment> = Vec::new();
                for item in &transfer.items {
                    self.apply_leg(
                        &mut applied,
                        "transfer_cancel",
                        id,
                        item.product_id,
                        transfer.origin_location_id,
                        item.quantity,
                        OperationType::TransferReversalIn,
                    )
                    .await?;
                    self.apply_leg(
                        &mut applied,
                        "transfer_cancel",
                        id,
                        item.product_id,
                        transfer.destination_location_id,
                        -item.quantity,
                        OperationType::TransferReversalOut,
                    )
                    .await?;
                }

                let updated = with_timeout(
                    self.store_timeout,
                    self.store.update_transfer_status(id, TransferStatus::Cancelled),
                )
                .await?;
                self.event_sender
                    .send_or_log(Event::TransferCancelled(id))
                    .await;
                info!(transfer_id = %id, "concluded transfer reversed and cancelled");
                Ok(CancelResult {
                    transfer: updated,
                    already_cancelled: false,
                })
            }
        }
    }

    /// One ledger call of a two-leg movement. On failure the error is
    /// wrapped with whatever already applied; on success the adjustment is
    /// appended to the running record.
    #[allow(clippy::too_many_arguments)]
    async fn apply_leg(
        &self,
        applied: &mut Vec<AppliedAdjustment>,
        operation: &str,
        order_id: Uuid,
        product_id: Uuid,
        location_id: Uuid,
        delta: i64,
        op_type: OperationType,
    ) -> Result<(), ServiceError> {
        let context = AdjustContext::with_note(op_type, format!("transfer {order_id}"));
        match self
            .ledger
            .adjust(product_id, location_id, delta, context)
            .await
        {
            Ok(new_quantity) => {
                applied.push(AppliedAdjustment {
                    product_id,
                    location_id,
                    delta,
                    new_quantity,
                });
                Ok(())
            }
            Err(cause) => {
                if !applied.is_empty() {
                    error!(
                        transfer_id = %order_id,
                        %product_id,
                        applied = applied.len(),
                        %cause,
                        "transfer stopped partway; applied adjustments are not rolled back"
                    );
                }
                Err(ServiceError::partial_application(
                    operation,
                    order_id,
                    std::mem::take(applied),
                    product_id,
                    cause,
                ))
            }
        }
    }
}
