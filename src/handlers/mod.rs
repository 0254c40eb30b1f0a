pub mod sales;
pub mod stock_levels;
pub mod transfers;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{HistoryRecorder, SaleService, StockLedger, TransferService};
use crate::store::SharedStore;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub stock_ledger: Arc<StockLedger>,
    pub transfers: Arc<TransferService>,
    pub sales: Arc<SaleService>,
}

impl AppServices {
    pub fn new(store: SharedStore, event_sender: EventSender, config: &AppConfig) -> Self {
        let timeout = config.store_timeout();
        let history = HistoryRecorder::new(store.clone(), config.history_enabled);
        let stock_ledger = Arc::new(StockLedger::new(
            store.clone(),
            history,
            event_sender.clone(),
            timeout,
        ));
        let transfers = Arc::new(TransferService::new(
            store.clone(),
            stock_ledger.clone(),
            event_sender.clone(),
            timeout,
        ));
        let sales = Arc::new(SaleService::new(
            store,
            stock_ledger.clone(),
            event_sender,
            timeout,
        ));

        Self {
            stock_ledger,
            transfers,
            sales,
        }
    }
}
