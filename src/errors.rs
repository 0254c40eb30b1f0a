use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Standardized error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Conflict", "Unprocessable Entity")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Structured detail, present for partial-application failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// A single ledger mutation that had already been applied when a multi-item
/// operation stopped partway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AppliedAdjustment {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub delta: i64,
    pub new_quantity: i64,
}

/// Inspectable record of a multi-item operation that stopped partway through
/// its item list. Adjustments listed in `applied` are NOT rolled back; the
/// caller drives manual correction or retry from this report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PartialApplicationReport {
    /// Which operation stopped (e.g. "transfer_confirm", "sale_edit")
    pub operation: String,
    /// The transfer or sale order the operation was acting on
    pub order_id: Uuid,
    /// Ledger mutations applied before the failure, in application order
    pub applied: Vec<AppliedAdjustment>,
    /// The product whose adjustment failed
    pub failed_product_id: Uuid,
    /// The underlying failure, rendered as a message
    pub cause: String,
}

impl std::fmt::Display for PartialApplicationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} for order {} stopped at product {} after {} applied adjustment(s): {}",
            self.operation,
            self.order_id,
            self.failed_product_id,
            self.applied.len(),
            self.cause
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("insufficient stock for product {product_id} at location {location_id}: required {required}, available {available}, short by {}", .required - .available)]
    InsufficientStock {
        product_id: Uuid,
        location_id: Uuid,
        available: i64,
        required: i64,
    },

    #[error("adjustment of {delta} for product {product_id} at location {location_id} would drive stock below zero (current {current})")]
    NegativeStockResult {
        product_id: Uuid,
        location_id: Uuid,
        current: i64,
        delta: i64,
    },

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("sale {0} is paid and locked against edit and deletion")]
    SaleLocked(Uuid),

    #[error("{0}")]
    PartialApplication(Box<PartialApplicationReport>),

    #[error("not found: {0}")]
    RecordNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("event error: {0}")]
    Event(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl ServiceError {
    /// Wraps a mid-loop failure as a partial-application error. When nothing
    /// had been applied yet the operation had zero side effects, so the
    /// original error is returned unchanged.
    pub fn partial_application(
        operation: &str,
        order_id: Uuid,
        applied: Vec<AppliedAdjustment>,
        failed_product_id: Uuid,
        cause: ServiceError,
    ) -> ServiceError {
        if applied.is_empty() {
            return cause;
        }
        ServiceError::PartialApplication(Box::new(PartialApplicationReport {
            operation: operation.to_string(),
            order_id,
            applied,
            failed_product_id,
            cause: cause.to_string(),
        }))
    }

    /// Returns the HTTP status code for this error.
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NegativeStockResult { .. }
            | Self::SaleLocked(_)
            | Self::PartialApplication(_) => StatusCode::CONFLICT,
            Self::InvalidTransfer(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RecordNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Event(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message suitable for HTTP responses. Internal errors get a
    /// generic message; the detail stays in the logs.
    pub fn response_message(&self) -> String {
        match self {
            Self::Persistence(_) => "Persistence error".to_string(),
            Self::Event(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.response_message();

        let details = match &self {
            ServiceError::PartialApplication(report) => serde_json::to_value(report.as_ref()).ok(),
            _ => None,
        };

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            details,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
