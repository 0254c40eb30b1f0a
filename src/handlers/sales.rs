use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{PaymentStatus, SaleItem, SaleOrder};
use crate::{ApiResponse, ApiResult, AppState};

// Serialize is required by the length validator on the containing item list.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SaleItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub unit_price: Decimal,
    #[serde(default)]
    pub line_discount: Decimal,
}

impl From<SaleItemRequest> for SaleItem {
    fn from(req: SaleItemRequest) -> Self {
        SaleItem {
            product_id: req.product_id,
            quantity: req.quantity,
            unit_price: req.unit_price,
            line_discount: req.line_discount,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSaleRequest {
    pub location_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<SaleItemRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSaleRequest {
    pub location_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<SaleItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

pub fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_sale))
        .route("/:id", get(get_sale).put(update_sale).delete(delete_sale))
        .route("/:id/payment-status", post(update_payment_status))
}

/// Create a sale; stock is debited at creation time.
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 200, description = "Sale created, stock debited"),
        (status = 400, description = "Malformed sale", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    Json(req): Json<CreateSaleRequest>,
) -> ApiResult<SaleOrder> {
    req.validate()?;
    let items = req.items.into_iter().map(SaleItem::from).collect();
    let sale = state
        .services
        .sales
        .create_sale(req.location_id, items)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    responses(
        (status = 200, description = "Sale found"),
        (status = 404, description = "Unknown sale", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn get_sale(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<SaleOrder> {
    let sale = state.services.sales.get_sale(id).await?;
    Ok(Json(ApiResponse::success(sale)))
}

/// Replace the sale's items and location, reconciling stock against the
/// previous item set.
#[utoipa::path(
    put,
    path = "/api/v1/sales/{id}",
    request_body = UpdateSaleRequest,
    responses(
        (status = 200, description = "Sale edited, stock reconciled"),
        (status = 409, description = "Sale locked or edit stopped partway", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSaleRequest>,
) -> ApiResult<SaleOrder> {
    req.validate()?;
    let items = req.items.into_iter().map(SaleItem::from).collect();
    let sale = state
        .services
        .sales
        .edit_sale(id, req.location_id, items)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

/// Delete an unlocked sale. Stock is deliberately not restored.
#[utoipa::path(
    delete,
    path = "/api/v1/sales/{id}",
    responses(
        (status = 200, description = "Sale deleted; stock not restored"),
        (status = 409, description = "Sale locked", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown sale", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn delete_sale(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Value> {
    state.services.sales.delete_sale(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}

#[utoipa::path(
    post,
    path = "/api/v1/sales/{id}/payment-status",
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated"),
        (status = 404, description = "Unknown sale", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePaymentStatusRequest>,
) -> ApiResult<SaleOrder> {
    let sale = state
        .services
        .sales
        .update_payment_status(id, req.payment_status)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}
