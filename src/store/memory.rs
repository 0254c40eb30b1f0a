//! In-memory backend. Serves as the test double for every service test and
//! as the dev-mode backend for the server binary.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{StockStore, StoreError};
use crate::models::{
    HistoryEntry, PaymentStatus, SaleOrder, StockLevel, TransferOrder, TransferStatus,
};

/// Stores everything in process memory. Per-key serialization of
/// `adjust_stock` comes from the dashmap entry guard: the read, the
/// negativity check, and the write all happen while the shard lock is held.
#[derive(Default)]
pub struct InMemoryStockStore {
    levels: DashMap<(Uuid, Uuid), StockLevel>,
    transfers: DashMap<Uuid, TransferOrder>,
    sales: DashMap<Uuid, SaleOrder>,
    history: RwLock<Vec<HistoryEntry>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn get_stock_level(
        &self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<i64, StoreError> {
        Ok(self
            .levels
            .get(&(product_id, location_id))
            .map(|level| level.quantity)
            .unwrap_or(0))
    }

    async fn adjust_stock(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        delta: i64,
    ) -> Result<i64, StoreError> {
        match self.levels.entry((product_id, location_id)) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().quantity;
                let next = current.checked_add(delta).ok_or_else(|| {
                    StoreError::Backend(format!(
                        "quantity overflow for product {product_id} at location {location_id}"
                    ))
                })?;
                if next < 0 {
                    return Err(StoreError::NegativeStock {
                        product_id,
                        location_id,
                        current,
                        delta,
                    });
                }
                let level = occupied.get_mut();
                level.quantity = next;
                level.updated_at = Utc::now();
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                // Rows are created lazily on the first positive adjustment.
                if delta < 0 {
                    return Err(StoreError::NegativeStock {
                        product_id,
                        location_id,
                        current: 0,
                        delta,
                    });
                }
                vacant.insert(StockLevel {
                    product_id,
                    location_id,
                    quantity: delta,
                    updated_at: Utc::now(),
                });
                Ok(delta)
            }
        }
    }

    async fn list_stock_levels(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<StockLevel>, StoreError> {
        let mut levels: Vec<StockLevel> = self
            .levels
            .iter()
            .filter(|entry| location_id.map_or(true, |loc| entry.location_id == loc))
            .map(|entry| entry.value().clone())
            .collect();
        levels.sort_by_key(|level| (level.location_id, level.product_id));
        Ok(levels)
    }

    async fn insert_transfer(&self, transfer: TransferOrder) -> Result<(), StoreError> {
        match self.transfers.entry(transfer.id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "transfer {} already exists",
                transfer.id
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(transfer);
                Ok(())
            }
        }
    }

    async fn get_transfer(&self, id: Uuid) -> Result<TransferOrder, StoreError> {
        self.transfers
            .get(&id)
            .map(|transfer| transfer.clone())
            .ok_or_else(|| StoreError::NotFound(format!("transfer {id}")))
    }

    async fn update_transfer_status(
        &self,
        id: Uuid,
        status: TransferStatus,
    ) -> Result<TransferOrder, StoreError> {
        let mut transfer = self
            .transfers
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("transfer {id}")))?;
        transfer.status = status;
        transfer.updated_at = Utc::now();
        Ok(transfer.clone())
    }

    async fn insert_sale(&self, sale: SaleOrder) -> Result<(), StoreError> {
        match self.sales.entry(sale.id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "sale {} already exists",
                sale.id
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(sale);
                Ok(())
            }
        }
    }

    async fn get_sale(&self, id: Uuid) -> Result<SaleOrder, StoreError> {
        self.sales
            .get(&id)
            .map(|sale| sale.clone())
            .ok_or_else(|| StoreError::NotFound(format!("sale {id}")))
    }

    async fn replace_sale(&self, sale: SaleOrder) -> Result<(), StoreError> {
        let mut stored = self
            .sales
            .get_mut(&sale.id)
            .ok_or_else(|| StoreError::NotFound(format!("sale {}", sale.id)))?;
        *stored = sale;
        Ok(())
    }

    async fn delete_sale(&self, id: Uuid) -> Result<(), StoreError> {
        self.sales
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("sale {id}")))
    }

    async fn update_sale_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<SaleOrder, StoreError> {
        let mut sale = self
            .sales
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("sale {id}")))?;
        sale.payment_status = status;
        sale.updated_at = Utc::now();
        Ok(sale.clone())
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut history = self
            .history
            .write()
            .map_err(|_| StoreError::Backend("history lock poisoned".into()))?;
        history.push(entry);
        Ok(())
    }

    async fn list_history(
        &self,
        product_id: Option<Uuid>,
        location_id: Option<Uuid>,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let history = self
            .history
            .read()
            .map_err(|_| StoreError::Backend("history lock poisoned".into()))?;
        Ok(history
            .iter()
            .filter(|entry| {
                product_id.map_or(true, |p| entry.product_id == p)
                    && location_id.map_or(true, |l| entry.location_id == l)
            })
            .cloned()
            .collect())
    }
}
