//! Expanded order representations returned by the read paths.
//!
//! References are joined the way the HTTP layer serves them: each line item
//! carries its product record and the order carries its owning user, either
//! of which may have been deleted since the order was written (`None`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_auth::User;
use stockroom_core::{OrderId, ProductId, UserId};
use stockroom_products::Product;

use crate::order::{Order, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemView {
    pub product_id: ProductId,
    pub product: Option<Product>,
    pub quantity: i64,
    pub unit_price: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub line_items: Vec<LineItemView>,
    pub total_amount: u64,
    pub status: OrderStatus,
    pub user_id: UserId,
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
}

impl OrderView {
    /// Join an order against already-resolved products and its owning user.
    pub fn assemble(
        order: Order,
        products: &HashMap<ProductId, Product>,
        user: Option<User>,
    ) -> Self {
        let line_items = order
            .line_items
            .into_iter()
            .map(|item| LineItemView {
                product_id: item.product_id,
                product: products.get(&item.product_id).cloned(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        Self {
            id: order.id,
            line_items,
            total_amount: order.total_amount,
            status: order.status,
            user_id: order.user_id,
            user,
            created_at: order.created_at,
        }
    }
}
