use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, OrderId, ProductId, UserId};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// Order line: product, quantity, unit price.
///
/// The unit price is snapshotted at order time and never re-read from the
/// product's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

impl OrderLineItem {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: u64) -> DomainResult<Self> {
        if quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        Ok(Self {
            product_id,
            quantity,
            unit_price,
        })
    }

    pub fn line_total(&self) -> u64 {
        (self.quantity as u64).saturating_mul(self.unit_price)
    }
}

/// Order record. `total_amount` is always derived from the line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub line_items: Vec<OrderLineItem>,
    /// Derived: sum of `quantity * unit_price` over line items.
    pub total_amount: u64,
    pub status: OrderStatus,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        user_id: UserId,
        line_items: Vec<OrderLineItem>,
        status: OrderStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        let total_amount = Self::total_of(&line_items);
        Self {
            id,
            line_items,
            total_amount,
            status,
            user_id,
            created_at,
        }
    }

    pub fn total_of(items: &[OrderLineItem]) -> u64 {
        items
            .iter()
            .fold(0u64, |total, item| total.saturating_add(item.line_total()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_item_rejects_quantity_below_one() {
        let err = OrderLineItem::new(ProductId::new(), 0, 100).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn total_is_sum_of_line_totals() {
        let items = vec![
            OrderLineItem::new(ProductId::new(), 4, 500).unwrap(),
            OrderLineItem::new(ProductId::new(), 2, 250).unwrap(),
        ];
        assert_eq!(Order::total_of(&items), 2500);
    }

    #[test]
    fn order_new_derives_total() {
        let items = vec![OrderLineItem::new(ProductId::new(), 3, 100).unwrap()];
        let order = Order::new(
            OrderId::new(),
            UserId::new(),
            items,
            OrderStatus::Pending,
            Utc::now(),
        );
        assert_eq!(order.total_amount, 300);
    }

    #[test]
    fn status_parses_lowercase_wire_form() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
