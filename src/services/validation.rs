//! Stateless policy checks consulted before mutation. Every failure here
//! fires strictly before any ledger write, so it blocks the whole operation
//! with zero side effects.

use std::time::Duration;

use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{SaleItem, SaleOrder, TransferItem};
use crate::store::{with_timeout, StockStore};

/// Checks that `location_id` currently holds at least `required` units of
/// `product_id`. Advisory at transfer creation, binding before a debit.
pub async fn ensure_sufficient_stock(
    store: &dyn StockStore,
    timeout: Duration,
    product_id: Uuid,
    location_id: Uuid,
    required: i64,
) -> Result<(), ServiceError> {
    let available = with_timeout(timeout, store.get_stock_level(product_id, location_id)).await?;
    if available < required {
        return Err(ServiceError::InsufficientStock {
            product_id,
            location_id,
            available,
            required,
        });
    }
    Ok(())
}

/// Shape checks for a transfer request: distinct endpoints, at least one
/// item, strictly positive quantities.
pub fn ensure_transfer_shape(
    origin_location_id: Uuid,
    destination_location_id: Uuid,
    items: &[TransferItem],
) -> Result<(), ServiceError> {
    if origin_location_id == destination_location_id {
        return Err(ServiceError::InvalidTransfer(
            "origin and destination locations must differ".into(),
        ));
    }
    if items.is_empty() {
        return Err(ServiceError::InvalidTransfer(
            "transfer must contain at least one item".into(),
        ));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(ServiceError::InvalidTransfer(format!(
                "quantity for product {} must be positive, got {}",
                item.product_id, item.quantity
            )));
        }
    }
    Ok(())
}

/// Shape checks for a sale item list: non-empty, strictly positive
/// quantities.
pub fn ensure_sale_items(items: &[SaleItem]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::Validation(
            "sale must contain at least one item".into(),
        ));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(ServiceError::Validation(format!(
                "quantity for product {} must be positive, got {}",
                item.product_id, item.quantity
            )));
        }
    }
    Ok(())
}

/// A paid sale is locked against edit and deletion.
pub fn ensure_sale_unlocked(sale: &SaleOrder) -> Result<(), ServiceError> {
    if sale.payment_status.is_locked() {
        return Err(ServiceError::SaleLocked(sale.id));
    }
    Ok(())
}
