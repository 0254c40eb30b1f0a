use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// Payment state of a sale. A `Paid` sale is locked: no further edit or
/// deletion is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

/// One line of a sale order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SaleItem {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    #[serde(default)]
    pub line_discount: Decimal,
}

impl SaleItem {
    /// `unit_price * quantity - line_discount`, floored at zero.
    pub fn line_total(&self) -> Decimal {
        let gross = self.unit_price * Decimal::from(self.quantity) - self.line_discount;
        gross.max(Decimal::ZERO)
    }
}

/// A sale at a single location. Stock is debited at creation time; edits
/// reconcile against a snapshot of the previous item set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SaleOrder {
    pub id: Uuid,
    pub location_id: Uuid,
    pub items: Vec<SaleItem>,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SaleOrder {
    pub fn new(location_id: Uuid, items: Vec<SaleItem>) -> Self {
        let now = Utc::now();
        let total_amount = Self::total_of(&items);
        Self {
            id: Uuid::new_v4(),
            location_id,
            items,
            payment_status: PaymentStatus::Pending,
            total_amount,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_of(items: &[SaleItem]) -> Decimal {
        items.iter().map(SaleItem::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(quantity: i64, unit_price: Decimal, line_discount: Decimal) -> SaleItem {
        SaleItem {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price,
            line_discount,
        }
    }

    #[test]
    fn line_total_applies_discount() {
        let line = item(3, dec!(9.99), dec!(2.00));
        assert_eq!(line.line_total(), dec!(27.97));
    }

    #[test]
    fn line_total_floors_at_zero() {
        let line = item(1, dec!(5.00), dec!(10.00));
        assert_eq!(line.line_total(), Decimal::ZERO);
    }

    #[test]
    fn order_total_sums_lines() {
        let items = vec![
            item(2, dec!(4.50), Decimal::ZERO),
            item(1, dec!(20.00), dec!(5.00)),
        ];
        let sale = SaleOrder::new(Uuid::new_v4(), items);
        assert_eq!(sale.total_amount, dec!(24.00));
        assert_eq!(sale.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn paid_status_locks_the_sale() {
        assert!(PaymentStatus::Paid.is_locked());
        assert!(!PaymentStatus::Pending.is_locked());
        assert!(!PaymentStatus::Partial.is_locked());
    }
}
