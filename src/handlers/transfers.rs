use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{TransferItem, TransferOrder};
use crate::services::CancelResult;
use crate::{ApiResponse, ApiResult, AppState};

// Serialize is required by the length validator on the containing item list.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct TransferItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTransferRequest {
    pub origin_location_id: Uuid,
    pub destination_location_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<TransferItemRequest>,
}

pub fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_transfer))
        .route("/:id", get(get_transfer))
        .route("/:id/confirm", post(confirm_transfer))
        .route("/:id/cancel", post(cancel_transfer))
}

/// Create a transfer proposal. No stock moves until confirmation.
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = CreateTransferRequest,
    responses(
        (status = 200, description = "Transfer created in pending state"),
        (status = 400, description = "Malformed transfer", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock at origin", body = crate::errors::ErrorResponse),
    ),
    tag = "transfers"
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(req): Json<CreateTransferRequest>,
) -> ApiResult<TransferOrder> {
    req.validate()?;
    let items = req
        .items
        .into_iter()
        .map(|item| TransferItem {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();
    let transfer = state
        .services
        .transfers
        .create_transfer(req.origin_location_id, req.destination_location_id, items)
        .await?;
    Ok(Json(ApiResponse::success(transfer)))
}

#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}",
    responses(
        (status = 200, description = "Transfer found"),
        (status = 404, description = "Unknown transfer", body = crate::errors::ErrorResponse),
    ),
    tag = "transfers"
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferOrder> {
    let transfer = state.services.transfers.get_transfer(id).await?;
    Ok(Json(ApiResponse::success(transfer)))
}

/// Apply the movement and conclude the order.
#[utoipa::path(
    post,
    path = "/api/v1/transfers/{id}/confirm",
    responses(
        (status = 200, description = "Transfer concluded"),
        (status = 400, description = "Illegal state transition", body = crate::errors::ErrorResponse),
        (status = 409, description = "Stopped partway; see details", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock at origin", body = crate::errors::ErrorResponse),
    ),
    tag = "transfers"
)]
pub async fn confirm_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferOrder> {
    let transfer = state.services.transfers.confirm_transfer(id).await?;
    Ok(Json(ApiResponse::success(transfer)))
}

/// Cancel the order, reversing the movement when it was already applied.
#[utoipa::path(
    post,
    path = "/api/v1/transfers/{id}/cancel",
    responses(
        (status = 200, description = "Transfer cancelled (or already was)"),
        (status = 409, description = "Reversal blocked or stopped partway", body = crate::errors::ErrorResponse),
    ),
    tag = "transfers"
)]
pub async fn cancel_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CancelResult> {
    let result = state.services.transfers.cancel_transfer(id).await?;
    Ok(Json(ApiResponse::success(result)))
}
