pub mod history;
pub mod location;
pub mod product;
pub mod sale_order;
pub mod stock_level;
pub mod transfer_order;

pub use history::{HistoryEntry, OperationType};
pub use location::Location;
pub use product::Product;
pub use sale_order::{PaymentStatus, SaleItem, SaleOrder};
pub use stock_level::StockLevel;
pub use transfer_order::{TransferItem, TransferOrder, TransferStatus};
