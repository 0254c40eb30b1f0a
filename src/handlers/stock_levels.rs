use axum::{
    extract::{Json, Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{HistoryEntry, StockLevel};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockLevelFilters {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockLevelQuantity {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub quantity: i64,
}

pub fn stock_level_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock_levels))
        .route("/quantity", get(get_stock_level))
        .route("/history", get(list_history))
}

/// All known stock rows, optionally filtered by location.
#[utoipa::path(
    get,
    path = "/api/v1/stock-levels",
    params(StockLevelFilters),
    responses((status = 200, description = "Stock levels returned")),
    tag = "stock-levels"
)]
pub async fn list_stock_levels(
    State(state): State<AppState>,
    Query(filters): Query<StockLevelFilters>,
) -> ApiResult<Vec<StockLevel>> {
    let levels = state
        .services
        .stock_ledger
        .list(filters.location_id)
        .await?;
    Ok(Json(ApiResponse::success(levels)))
}

/// Quantity for one (product, location) key; 0 when no row exists.
#[utoipa::path(
    get,
    path = "/api/v1/stock-levels/quantity",
    params(StockLevelFilters),
    responses(
        (status = 200, description = "Quantity returned"),
        (status = 400, description = "Missing key parameters", body = crate::errors::ErrorResponse),
    ),
    tag = "stock-levels"
)]
pub async fn get_stock_level(
    State(state): State<AppState>,
    Query(filters): Query<StockLevelFilters>,
) -> ApiResult<StockLevelQuantity> {
    let (product_id, location_id) = match (filters.product_id, filters.location_id) {
        (Some(product_id), Some(location_id)) => (product_id, location_id),
        _ => {
            return Err(ServiceError::Validation(
                "both product_id and location_id are required".into(),
            ))
        }
    };
    let quantity = state
        .services
        .stock_ledger
        .get(product_id, location_id)
        .await?;
    Ok(Json(ApiResponse::success(StockLevelQuantity {
        product_id,
        location_id,
        quantity,
    })))
}

/// Best-effort movement history; diagnostic, never authoritative.
#[utoipa::path(
    get,
    path = "/api/v1/stock-levels/history",
    params(StockLevelFilters),
    responses((status = 200, description = "History entries returned")),
    tag = "stock-levels"
)]
pub async fn list_history(
    State(state): State<AppState>,
    Query(filters): Query<StockLevelFilters>,
) -> ApiResult<Vec<HistoryEntry>> {
    let entries = state
        .services
        .stock_ledger
        .history(filters.product_id, filters.location_id)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}
