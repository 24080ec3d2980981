//! Request DTOs and JSON mapping helpers.

use axum::http::StatusCode;
use serde::Deserialize;

use stockroom_auth::User;
use stockroom_core::Page;
use stockroom_orders::{LineItemRequest, OrderStatus, OrderView};
use stockroom_products::Product;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LineItemDto {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub line_items: Vec<LineItemDto>,
    /// Accepted for wire compatibility; the total is recomputed server-side.
    #[serde(default)]
    pub total_amount: Option<u64>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub line_items: Option<Vec<LineItemDto>>,
    /// Accepted for wire compatibility; the total is recomputed server-side.
    #[serde(default)]
    pub total_amount: Option<u64>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub price: u64,
    pub category: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Parse wire line items, rejecting malformed product ids up front.
pub fn parse_line_items(
    items: Vec<LineItemDto>,
) -> Result<Vec<LineItemRequest>, axum::response::Response> {
    items
        .into_iter()
        .map(|dto| {
            let product_id = dto.product_id.parse().map_err(|_| {
                errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
            })?;
            Ok(LineItemRequest {
                product_id,
                quantity: dto.quantity,
                unit_price: dto.unit_price,
            })
        })
        .collect()
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id.to_string(),
        "name": product.name,
        "sku": product.sku.as_str(),
        "price": product.price,
        "category": product.category,
        "stock": product.stock,
        "in_stock": product.in_stock,
        "description": product.description,
        "created_at": product.created_at.to_rfc3339(),
    })
}

pub fn user_to_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "email": user.email,
        "name": user.name,
        "role": user.role.as_str(),
    })
}

pub fn order_view_to_json(view: &OrderView) -> serde_json::Value {
    serde_json::json!({
        "id": view.id.to_string(),
        "line_items": view.line_items.iter().map(|item| serde_json::json!({
            "product_id": item.product_id.to_string(),
            "product": item.product.as_ref().map(product_to_json),
            "quantity": item.quantity,
            "unit_price": item.unit_price,
        })).collect::<Vec<_>>(),
        "total_amount": view.total_amount,
        "status": view.status.as_str(),
        "user_id": view.user_id.to_string(),
        "user": view.user.as_ref().map(user_to_json),
        "created_at": view.created_at.to_rfc3339(),
    })
}

pub fn order_page_to_json(page: &Page<OrderView>) -> serde_json::Value {
    serde_json::json!({
        "items": page.items.iter().map(order_view_to_json).collect::<Vec<_>>(),
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
    })
}

pub fn product_page_to_json(page: &Page<Product>) -> serde_json::Value {
    serde_json::json!({
        "items": page.items.iter().map(product_to_json).collect::<Vec<_>>(),
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
    })
}
