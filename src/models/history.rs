use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// What kind of movement produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationType {
    ManualAdjustment,
    TransferOut,
    TransferIn,
    TransferReversalOut,
    TransferReversalIn,
    Sale,
    SaleReconciliation,
    SaleReturn,
}

/// Append-only record of a single ledger mutation. Diagnostic only: the
/// stock level remains authoritative even when entries are lost, and the
/// recorder never blocks or aborts the mutation that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub delta: i64,
    pub operation: OperationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_id: Uuid,
        location_id: Uuid,
        previous_quantity: i64,
        new_quantity: i64,
        operation: OperationType,
        actor: Option<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            location_id,
            previous_quantity,
            new_quantity,
            delta: new_quantity - previous_quantity,
            operation,
            actor,
            note,
            recorded_at: Utc::now(),
        }
    }
}
