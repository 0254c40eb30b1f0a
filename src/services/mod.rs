pub mod history;
pub mod sales;
pub mod stock_ledger;
pub mod transfers;
pub mod validation;

pub use history::HistoryRecorder;
pub use sales::SaleService;
pub use stock_ledger::{AdjustContext, StockLedger};
pub use transfers::{CancelResult, TransferService};
