use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use stockroom_core::{OrderId, PageRequest};
use stockroom_orders::{CreateOrder, OrderFilter, OrderStatus, UpdateOrder};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::AuthContext;
use crate::middleware::{self, AuthState};

/// Reads are public; placing an order requires authentication and mutating
/// an existing one requires the admin role.
pub fn router(auth: AuthState) -> Router {
    let public = Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order));

    let protected = Router::new()
        .route("/", post(create_order))
        .route("/:id", put(update_order).delete(delete_order))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            middleware::auth_middleware,
        ));

    public.merge(protected)
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListOrdersQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref() {
        Some(raw) => match raw.parse::<OrderStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_status", e.to_string());
            }
        },
        None => None,
    };

    let page = PageRequest::new(query.page.unwrap_or(1), query.limit.unwrap_or(10));

    match services.orders.list_orders(OrderFilter { status }, page).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::json!({ "data": dto::order_page_to_json(&result) })),
        )
            .into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    match services.orders.get_order(id).await {
        Ok(Some(view)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "data": dto::order_view_to_json(&view) })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_any_role(&ctx, &["user", "admin"]) {
        return resp;
    }

    let line_items = match dto::parse_line_items(body.line_items) {
        Ok(items) => items,
        Err(resp) => return resp,
    };

    let request = CreateOrder {
        user_id: ctx.user_id(),
        line_items,
        status: body.status.unwrap_or(OrderStatus::Pending),
    };

    match services.orders.create_order(request).await {
        Ok(view) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "data": dto::order_view_to_json(&view) })),
        )
            .into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_any_role(&ctx, &["admin"]) {
        return resp;
    }

    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    let line_items = match body.line_items {
        Some(items) => match dto::parse_line_items(items) {
            Ok(items) => Some(items),
            Err(resp) => return resp,
        },
        None => None,
    };

    let request = UpdateOrder {
        line_items,
        status: body.status,
    };

    match services.orders.update_order(id, request).await {
        Ok(Some(view)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "data": dto::order_view_to_json(&view) })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_any_role(&ctx, &["admin"]) {
        return resp;
    }

    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    match services.orders.delete_order(id).await {
        Ok(Some(_)) => StatusCode::NO_CONTENT.into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::order_error_to_response(e),
    }
}
