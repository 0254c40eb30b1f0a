//! Persistent store abstraction.
//!
//! Core services never touch a concrete backend directly; they go through
//! [`StockStore`], injected at startup. `adjust_stock` is the single
//! correctness-critical primitive: it must apply the delta and reject
//! negative results atomically per `(product, location)` key, so concurrent
//! callers can never lose updates to a read-then-write race.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    HistoryEntry, PaymentStatus, SaleOrder, StockLevel, TransferOrder, TransferStatus,
};

pub mod memory;

pub use memory::InMemoryStockStore;

pub type SharedStore = Arc<dyn StockStore>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("adjustment of {delta} for product {product_id} at location {location_id} would drive stock below zero (current {current})")]
    NegativeStock {
        product_id: Uuid,
        location_id: Uuid,
        current: i64,
        delta: i64,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store call timed out after {0:?}; outcome unknown")]
    Timeout(Duration),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NegativeStock {
                product_id,
                location_id,
                current,
                delta,
            } => ServiceError::NegativeStockResult {
                product_id,
                location_id,
                current,
                delta,
            },
            StoreError::NotFound(what) => ServiceError::RecordNotFound(what),
            other => ServiceError::Persistence(other.to_string()),
        }
    }
}

/// Awaits a store round-trip under a bounded timeout. An elapsed timer means
/// the outcome is unknown, not failed; callers must not blind-retry a
/// mutation that timed out.
pub async fn with_timeout<T, F>(bound: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(bound, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(bound)),
    }
}

/// Contract every backend must implement. All methods are blocking
/// round-trips that can fail or time out independently of any other call in
/// the same logical operation.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Current quantity for the key; 0 when no row exists.
    async fn get_stock_level(&self, product_id: Uuid, location_id: Uuid)
        -> Result<i64, StoreError>;

    /// Atomically applies `delta` and returns the new quantity, or
    /// `StoreError::NegativeStock` (with no mutation) when the result would
    /// be negative. The check and the write happen under one per-key guard.
    async fn adjust_stock(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        delta: i64,
    ) -> Result<i64, StoreError>;

    /// All known stock rows, optionally filtered by location.
    async fn list_stock_levels(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<StockLevel>, StoreError>;

    async fn insert_transfer(&self, transfer: TransferOrder) -> Result<(), StoreError>;

    async fn get_transfer(&self, id: Uuid) -> Result<TransferOrder, StoreError>;

    async fn update_transfer_status(
        &self,
        id: Uuid,
        status: TransferStatus,
    ) -> Result<TransferOrder, StoreError>;

    async fn insert_sale(&self, sale: SaleOrder) -> Result<(), StoreError>;

    async fn get_sale(&self, id: Uuid) -> Result<SaleOrder, StoreError>;

    /// Replaces the whole sale record (items, location, totals) atomically.
    async fn replace_sale(&self, sale: SaleOrder) -> Result<(), StoreError>;

    async fn delete_sale(&self, id: Uuid) -> Result<(), StoreError>;

    async fn update_sale_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<SaleOrder, StoreError>;

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError>;

    async fn list_history(
        &self,
        product_id: Option<Uuid>,
        location_id: Option<Uuid>,
    ) -> Result<Vec<HistoryEntry>, StoreError>;
}
