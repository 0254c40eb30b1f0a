use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use stockroom_api::config::AppConfig;
use stockroom_api::errors::ServiceError;
use stockroom_api::events::{process_events, EventSender};
use stockroom_api::handlers::AppServices;
use stockroom_api::models::{
    HistoryEntry, OperationType, PaymentStatus, SaleOrder, StockLevel, TransferOrder,
    TransferStatus,
};
use stockroom_api::services::AdjustContext;
use stockroom_api::store::{InMemoryStockStore, SharedStore, StockStore, StoreError};

/// Backend whose `adjust_stock` hangs well past any reasonable timeout.
/// Counts invocations so tests can assert a timed-out call is not retried.
struct SlowStore {
    inner: InMemoryStockStore,
    adjust_delay: Duration,
    adjust_calls: AtomicUsize,
}

impl SlowStore {
    fn new(adjust_delay: Duration) -> Self {
        Self {
            inner: InMemoryStockStore::new(),
            adjust_delay,
            adjust_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StockStore for SlowStore {
    async fn get_stock_level(
        &self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<i64, StoreError> {
        self.inner.get_stock_level(product_id, location_id).await
    }

    async fn adjust_stock(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        delta: i64,
    ) -> Result<i64, StoreError> {
        self.adjust_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.adjust_delay).await;
        self.inner.adjust_stock(product_id, location_id, delta).await
    }

    async fn list_stock_levels(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<StockLevel>, StoreError> {
        self.inner.list_stock_levels(location_id).await
    }

    async fn insert_transfer(&self, transfer: TransferOrder) -> Result<(), StoreError> {
        self.inner.insert_transfer(transfer).await
    }

    async fn get_transfer(&self, id: Uuid) -> Result<TransferOrder, StoreError> {
        self.inner.get_transfer(id).await
    }

    async fn update_transfer_status(
        &self,
        id: Uuid,
        status: TransferStatus,
    ) -> Result<TransferOrder, StoreError> {
        self.inner.update_transfer_status(id, status).await
    }

    async fn insert_sale(&self, sale: SaleOrder) -> Result<(), StoreError> {
        self.inner.insert_sale(sale).await
    }

    async fn get_sale(&self, id: Uuid) -> Result<SaleOrder, StoreError> {
        self.inner.get_sale(id).await
    }

    async fn replace_sale(&self, sale: SaleOrder) -> Result<(), StoreError> {
        self.inner.replace_sale(sale).await
    }

    async fn delete_sale(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_sale(id).await
    }

    async fn update_sale_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<SaleOrder, StoreError> {
        self.inner.update_sale_payment_status(id, status).await
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        self.inner.append_history(entry).await
    }

    async fn list_history(
        &self,
        product_id: Option<Uuid>,
        location_id: Option<Uuid>,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        self.inner.list_history(product_id, location_id).await
    }
}

fn services_with_slow_store(
    adjust_delay: Duration,
    timeout_ms: u64,
) -> (AppServices, Arc<SlowStore>) {
    let mut cfg = AppConfig::new("127.0.0.1", 0, "test");
    cfg.store_timeout_ms = timeout_ms;

    let store = Arc::new(SlowStore::new(adjust_delay));
    let shared: SharedStore = store.clone();

    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    tokio::spawn(process_events(event_rx));
    let event_sender = EventSender::new(event_tx);

    let services = AppServices::new(shared, event_sender, &cfg);
    (services, store)
}

#[tokio::test]
async fn slow_adjust_surfaces_as_persistence_error() {
    let (services, store) = services_with_slow_store(Duration::from_secs(5), 50);
    let product = Uuid::new_v4();
    let location = Uuid::new_v4();

    let err = services
        .stock_ledger
        .adjust(
            product,
            location,
            3,
            AdjustContext::new(OperationType::ManualAdjustment),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Persistence(_));
    assert!(err.to_string().contains("timed out"));
    // A timed-out mutation has an unknown outcome; it must not be retried.
    assert_eq!(store.adjust_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fast_adjust_is_unaffected_by_the_timeout_bound() {
    let (services, store) = services_with_slow_store(Duration::from_millis(1), 5_000);
    let product = Uuid::new_v4();
    let location = Uuid::new_v4();

    let quantity = services
        .stock_ledger
        .adjust(
            product,
            location,
            3,
            AdjustContext::new(OperationType::ManualAdjustment),
        )
        .await
        .expect("adjust");
    assert_eq!(quantity, 3);
    assert_eq!(store.adjust_calls.load(Ordering::SeqCst), 1);
}
