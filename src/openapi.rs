use axum::{response::Json, routing::get, Router};
use utoipa::OpenApi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::transfers::create_transfer,
        crate::handlers::transfers::get_transfer,
        crate::handlers::transfers::confirm_transfer,
        crate::handlers::transfers::cancel_transfer,
        crate::handlers::sales::create_sale,
        crate::handlers::sales::get_sale,
        crate::handlers::sales::update_sale,
        crate::handlers::sales::delete_sale,
        crate::handlers::sales::update_payment_status,
        crate::handlers::stock_levels::list_stock_levels,
        crate::handlers::stock_levels::get_stock_level,
        crate::handlers::stock_levels::list_history,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::errors::PartialApplicationReport,
        crate::errors::AppliedAdjustment,
        crate::models::Location,
        crate::models::Product,
        crate::models::StockLevel,
        crate::models::TransferOrder,
        crate::models::TransferItem,
        crate::models::TransferStatus,
        crate::models::SaleOrder,
        crate::models::SaleItem,
        crate::models::PaymentStatus,
        crate::models::HistoryEntry,
        crate::models::OperationType,
        crate::services::CancelResult,
        crate::handlers::transfers::CreateTransferRequest,
        crate::handlers::transfers::TransferItemRequest,
        crate::handlers::sales::CreateSaleRequest,
        crate::handlers::sales::UpdateSaleRequest,
        crate::handlers::sales::SaleItemRequest,
        crate::handlers::sales::UpdatePaymentStatusRequest,
        crate::handlers::stock_levels::StockLevelQuantity,
    )),
    tags(
        (name = "transfers", description = "Transfer lifecycle: pending, concluded, cancelled"),
        (name = "sales", description = "Sale creation, reconciliation, deletion"),
        (name = "stock-levels", description = "Per-(product, location) quantities and movement history"),
    )
)]
pub struct ApiDoc;

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn openapi_routes() -> Router<AppState> {
    Router::new().route("/api-docs/openapi.json", get(serve_openapi))
}
