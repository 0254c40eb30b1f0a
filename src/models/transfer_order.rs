use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a transfer order.
///
/// Legal transitions: `Pending -> Concluded` (movement applied exactly once),
/// `Pending -> Cancelled` (no stock effect), `Concluded -> Cancelled`
/// (movement reversed exactly once). `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Concluded,
    Cancelled,
}

/// One line of a transfer order. Immutable once the order is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferItem {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// An order to move products from an origin to a destination location.
/// Creation reserves nothing; stock moves only on confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferOrder {
    pub id: Uuid,
    pub origin_location_id: Uuid,
    pub destination_location_id: Uuid,
    pub status: TransferStatus,
    pub items: Vec<TransferItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferOrder {
    pub fn new(
        origin_location_id: Uuid,
        destination_location_id: Uuid,
        items: Vec<TransferItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            origin_location_id,
            destination_location_id,
            status: TransferStatus::Pending,
            items,
            created_at: now,
            updated_at: now,
        }
    }
}
