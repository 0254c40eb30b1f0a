use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::errors::{AppliedAdjustment, ServiceError};
use crate::events::{Event, EventSender};
use crate::models::{OperationType, PaymentStatus, SaleItem, SaleOrder};
use crate::services::stock_ledger::{AdjustContext, StockLedger};
use crate::services::validation;
use crate::store::{with_timeout, SharedStore};

/// Per-product net changes between a sale's original item set and its
/// replacement: `new_qty - original_qty`, with a product missing on one side
/// counting as zero. Original products come first in their stored order,
/// then products that only appear in the new set. Duplicate lines for one
/// product are summed.
pub fn reconciliation_deltas(original: &[SaleItem], new_items: &[SaleItem]) -> Vec<(Uuid, i64)> {
    let mut new_quantities: HashMap<Uuid, i64> = HashMap::new();
    for item in new_items {
        *new_quantities.entry(item.product_id).or_insert(0) += item.quantity;
    }

    let mut original_quantities: HashMap<Uuid, i64> = HashMap::new();
    for item in original {
        *original_quantities.entry(item.product_id).or_insert(0) += item.quantity;
    }

    let mut deltas: Vec<(Uuid, i64)> = Vec::new();
    let mut seen: HashSet<Uuid> = HashSet::new();
    for item in original {
        if seen.insert(item.product_id) {
            let new_qty = new_quantities.get(&item.product_id).copied().unwrap_or(0);
            let original_qty = original_quantities[&item.product_id];
            deltas.push((item.product_id, new_qty - original_qty));
        }
    }
    for item in new_items {
        if seen.insert(item.product_id) {
            deltas.push((item.product_id, new_quantities[&item.product_id]));
        }
    }
    deltas
}

/// Computes and applies stock deltas for sale creation, edit, and deletion.
/// Edits reconcile against a snapshot of the sale taken exactly once at
/// entry — never against intermediate re-reads — and apply only the net
/// per-product change, so an edit is not spuriously rejected by a
/// restore-then-redebit pattern.
#[derive(Clone)]
pub struct SaleService {
    store: SharedStore,
    ledger: Arc<StockLedger>,
    event_sender: EventSender,
    store_timeout: Duration,
}

impl SaleService {
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

    /// Validates availability per item, persists the sale, then debits each
    /// item at the sale's location. Stock is debited at creation time.
    #[instrument(skip(self, items))]
    pub async fn create_sale(
        &self,
        location_id: Uuid,
        items: Vec<SaleItem>,
    ) -> Result<SaleOrder, ServiceError> {
        validation::ensure_sale_items(&items)?;
        for item in &items {
            validation::ensure_sufficient_stock(
                self.store.as_ref(),
                self.store_timeout,
                item.product_id,
                location_id,
                item.quantity,
            )
            .await?;
        }

        let sale = SaleOrder::new(location_id, items);
        with_timeout(self.store_timeout, self.store.insert_sale(sale.clone())).await?;

        let mut applied: Vec<AppliedAdjustment> = Vec::new();
        for item in &sale.items {
            self.apply(
                &mut applied,
                "sale_create",
                sale.id,
                item.product_id,
                location_id,
                -item.quantity,
                OperationType::Sale,
            )
            .await?;
        }

        self.event_sender
            .send_or_log(Event::SaleCreated(sale.id))
            .await;
        info!(sale_id = %sale.id, %location_id, total = %sale.total_amount, "sale created");
        Ok(sale)
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, id: Uuid) -> Result<SaleOrder, ServiceError> {
        let sale = with_timeout(self.store_timeout, self.store.get_sale(id)).await?;
        Ok(sale)
    }

    /// Reconciles stock against the sale as it was immediately before this
    /// edit, then replaces the item list and location atomically. Same
    /// location: net per-product deltas only. Different location: originals
    /// are fully restored at the old location and the new items debited at
    /// the new one, with every new item validated up front (restores at the
    /// old location cannot change availability at the new one, so a
    /// shortfall there rejects the edit before any mutation).
    ///
    /// Per-item validation precedes per-item mutation, but a multi-item edit
    /// is not all-or-nothing across items: a later-item failure surfaces as
    /// a partial-application error listing what already applied.
    #[instrument(skip(self, new_items))]
    pub async fn edit_sale(
        &self,
        id: Uuid,
        new_location_id: Uuid,
        new_items: Vec<SaleItem>,
    ) -> Result<SaleOrder, ServiceError> {
        validation::ensure_sale_items(&new_items)?;

        // The one snapshot this edit reconciles against.
        let original = with_timeout(self.store_timeout, self.store.get_sale(id)).await?;
        validation::ensure_sale_unlocked(&original)?;

        if new_location_id == original.location_id {
            self.reconcile_same_location(&original, &new_items).await?;
        } else {
            self.reconcile_cross_location(&original, new_location_id, &new_items)
                .await?;
        }

        let mut updated = original;
        updated.location_id = new_location_id;
        updated.items = new_items;
        updated.total_amount = SaleOrder::total_of(&updated.items);
        updated.updated_at = Utc::now();
        with_timeout(self.store_timeout, self.store.replace_sale(updated.clone())).await?;

        self.event_sender.send_or_log(Event::SaleUpdated(id)).await;
        info!(sale_id = %id, location_id = %updated.location_id, total = %updated.total_amount, "sale edited");
        Ok(updated)
    }

    /// Deletes an unlocked sale. Deliberate policy: deletion does NOT return
    /// the sale's units to the ledger — deletions are treated as rare
    /// administrative corrections whose stock effect is handled manually.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, id: Uuid) -> Result<(), ServiceError> {
        let sale = with_timeout(self.store_timeout, self.store.get_sale(id)).await?;
        validation::ensure_sale_unlocked(&sale)?;

        with_timeout(self.store_timeout, self.store.delete_sale(id)).await?;

        self.event_sender.send_or_log(Event::SaleDeleted(id)).await;
        info!(sale_id = %id, "sale deleted; stock not restored");
        Ok(())
    }

    /// Updates the payment status. Setting `paid` locks the sale against
    /// further edit and deletion; the lock also covers the status itself,
    /// so a paid sale cannot be downgraded back into an editable state.
    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<SaleOrder, ServiceError> {
        let current = with_timeout(self.store_timeout, self.store.get_sale(id)).await?;
        if current.payment_status.is_locked() && status != current.payment_status {
            return Err(ServiceError::SaleLocked(id));
        }

        let sale = with_timeout(
            self.store_timeout,
            self.store.update_sale_payment_status(id, status),
        )
        .await?;
        self.event_sender.send_or_log(Event::SaleUpdated(id)).await;
        info!(sale_id = %id, payment_status = %status, "sale payment status updated");
        Ok(sale)
    }

    async fn reconcile_same_location(
        &self,
        original: &SaleOrder,
        new_items: &[SaleItem],
    ) -> Result<(), ServiceError> {
        let location_id = original.location_id;
        let mut applied: Vec<AppliedAdjustment> = Vec::new();

        for (product_id, delta) in reconciliation_deltas(&original.items, new_items) {
            if delta == 0 {
                continue;
            }
            // A positive delta means more units sold and must clear an
            // availability check before the extra debit.
            if delta > 0 {
                if let Err(cause) = validation::ensure_sufficient_stock(
                    self.store.as_ref(),
                    self.store_timeout,
                    product_id,
                    location_id,
                    delta,
                )
                .await
                {
                    return Err(self.stop(applied, "sale_edit", original.id, product_id, cause));
                }
            }
            self.apply(
                &mut applied,
                "sale_edit",
                original.id,
                product_id,
                location_id,
                -delta,
                OperationType::SaleReconciliation,
            )
            .await?;
        }
        Ok(())
    }

    async fn reconcile_cross_location(
        &self,
        original: &SaleOrder,
        new_location_id: Uuid,
        new_items: &[SaleItem],
    ) -> Result<(), ServiceError> {
        // Restores happen at the original location, so current stock at the
        // new location is the correct baseline for every new item.
        for item in new_items {
            validation::ensure_sufficient_stock(
                self.store.as_ref(),
                self.store_timeout,
                item.product_id,
                new_location_id,
                item.quantity,
            )
            .await?;
        }

        let mut applied: Vec<AppliedAdjustment> = Vec::new();
        for item in &original.items {
            self.apply(
                &mut applied,
                "sale_edit",
                original.id,
                item.product_id,
                original.location_id,
                item.quantity,
                OperationType::SaleReturn,
            )
            .await?;
        }
        for item in new_items {
            self.apply(
                &mut applied,
                "sale_edit",
                original.id,
                item.product_id,
                new_location_id,
                -item.quantity,
                OperationType::Sale,
            )
            .await?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply(
        &self,
        applied: &mut Vec<AppliedAdjustment>,
        operation: &str,
        sale_id: Uuid,
        product_id: Uuid,
        location_id: Uuid,
        delta: i64,
        op_type: OperationType,
    ) -> Result<(), ServiceError> {
        let context = AdjustContext::with_note(op_type, format!("sale {sale_id}"));
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
            Err(cause) => Err(self.stop(std::mem::take(applied), operation, sale_id, product_id, cause)),
        }
    }

    fn stop(
        &self,
        applied: Vec<AppliedAdjustment>,
        operation: &str,
        sale_id: Uuid,
        failed_product_id: Uuid,
        cause: ServiceError,
    ) -> ServiceError {
        if !applied.is_empty() {
            error!(
                %sale_id,
                product_id = %failed_product_id,
                applied = applied.len(),
                %cause,
                "sale operation stopped partway; applied adjustments are not rolled back"
            );
        }
        ServiceError::partial_application(operation, sale_id, applied, failed_product_id, cause)
    }
}
