use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use stockroom_core::{Page, PageRequest, ProductId};
use stockroom_products::{Product, ProductChanges, ProductDraft, Sku};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::AuthContext;
use crate::middleware::{self, AuthState};

/// Catalog reads are public; all catalog writes require the admin role.
pub fn router(auth: AuthState) -> Router {
    let public = Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product));

    let protected = Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product).delete(delete_product))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            middleware::auth_middleware,
        ));

    public.merge(protected)
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListProductsQuery>,
) -> axum::response::Response {
    let page = PageRequest::new(query.page.unwrap_or(1), query.limit.unwrap_or(10));

    let items = match services.products.list(page.skip(), page.limit).await {
        Ok(items) => items,
        Err(e) => return errors::store_error_to_response(e),
    };
    let total = match services.products.count().await {
        Ok(total) => total,
        Err(e) => return errors::store_error_to_response(e),
    };

    let result = Page::new(items, total, page);
    (
        StatusCode::OK,
        Json(serde_json::json!({ "data": dto::product_page_to_json(&result) })),
    )
        .into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.products.find_by_id(id).await {
        Ok(Some(product)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "data": dto::product_to_json(&product) })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_any_role(&ctx, &["admin"]) {
        return resp;
    }

    let sku = match Sku::new(body.sku) {
        Ok(sku) => sku,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let draft = ProductDraft {
        name: body.name,
        sku,
        price: body.price,
        category: body.category,
        stock: body.stock,
        description: body.description,
    };

    let product = match Product::new(ProductId::new(), draft, Utc::now()) {
        Ok(product) => product,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.products.insert(product.clone()).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(product_id = %product.id, sku = %product.sku, "product created");

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": dto::product_to_json(&product) })),
    )
        .into_response()
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_any_role(&ctx, &["admin"]) {
        return resp;
    }

    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    let mut product = match services.products.find_by_id(id).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let changes = ProductChanges {
        name: body.name,
        price: body.price,
        category: body.category,
        stock: body.stock,
        description: body.description,
    };
    if let Err(e) = product.apply(changes) {
        return errors::domain_error_to_response(e);
    }

    if let Err(e) = services.products.save(&product).await {
        return errors::store_error_to_response(e);
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "data": dto::product_to_json(&product) })),
    )
        .into_response()
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_any_role(&ctx, &["admin"]) {
        return resp;
    }

    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.products.delete(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
