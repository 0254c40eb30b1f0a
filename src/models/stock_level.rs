use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The quantity of a product available at a location. Rows are created
/// lazily on the first positive adjustment and never deleted; a zero
/// quantity is a valid resting state, not an absence.
///
/// Invariant: `quantity >= 0` at every point observable between operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}
