use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use stockroom_api::app::{AppServices, build_app};
use stockroom_auth::{JwtClaims, Role};
use stockroom_core::UserId;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let app = build_app(AppServices::in_memory(), jwt_secret.to_string());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_product(
    client: &reqwest::Client,
    srv: &TestServer,
    admin_token: &str,
    stock: i64,
) -> String {
    let res = client
        .post(format!("{}/products", srv.base_url))
        .bearer_auth(admin_token)
        .json(&json!({
            "name": "Widget",
            "sku": "WID01",
            "price": 500,
            "category": "Electronics",
            "stock": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn product_stock(client: &reqwest::Client, srv: &TestServer, id: &str) -> i64 {
    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["data"]["stock"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_reads_are_public_but_writes_require_auth() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/orders", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total"].as_u64().unwrap(), 0);

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({ "line_items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_writes_require_the_admin_role() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let user_token = mint_jwt(jwt_secret, vec![Role::new("user")]);

    let res = client
        .post(format!("{}/products", srv.base_url))
        .bearer_auth(&user_token)
        .json(&json!({
            "name": "Widget",
            "sku": "WID01",
            "price": 500,
            "category": "Electronics",
            "stock": 5,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"].as_str().unwrap(), "forbidden");
}

#[tokio::test]
async fn order_ledger_flow_reconciles_stock_over_http() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let admin_token = mint_jwt(jwt_secret, vec![Role::new("admin")]);
    let user_token = mint_jwt(jwt_secret, vec![Role::new("user")]);

    let product_id = create_product(&client, &srv, &admin_token, 10).await;

    // Create: caller-supplied total is ignored, 4 * 500 is recomputed.
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&user_token)
        .json(&json!({
            "line_items": [
                { "product_id": product_id, "quantity": 4, "unit_price": 500 }
            ],
            "total_amount": 9999,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["total_amount"].as_u64().unwrap(), 2000);
    assert_eq!(body["data"]["status"].as_str().unwrap(), "pending");
    assert_eq!(
        body["data"]["line_items"][0]["product"]["name"]
            .as_str()
            .unwrap(),
        "Widget"
    );
    assert_eq!(product_stock(&client, &srv, &product_id).await, 6);

    // Update requires admin.
    let res = client
        .put(format!("{}/orders/{}", srv.base_url, order_id))
        .bearer_auth(&user_token)
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Edit down to 2 units: the difference returns to stock, the total is
    // recomputed, the bogus caller total is ignored.
    let res = client
        .put(format!("{}/orders/{}", srv.base_url, order_id))
        .bearer_auth(&admin_token)
        .json(&json!({
            "line_items": [
                { "product_id": product_id, "quantity": 2, "unit_price": 500 }
            ],
            "total_amount": 1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total_amount"].as_u64().unwrap(), 1000);
    assert_eq!(product_stock(&client, &srv, &product_id).await, 8);

    // Delete restores the rest.
    let res = client
        .delete(format!("{}/orders/{}", srv.base_url, order_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(product_stock(&client, &srv, &product_id).await, 10);

    let res = client
        .get(format!("{}/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn insufficient_stock_is_a_client_error() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let admin_token = mint_jwt(jwt_secret, vec![Role::new("admin")]);
    let user_token = mint_jwt(jwt_secret, vec![Role::new("user")]);

    let product_id = create_product(&client, &srv, &admin_token, 2).await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&user_token)
        .json(&json!({
            "line_items": [
                { "product_id": product_id, "quantity": 5, "unit_price": 500 }
            ],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"].as_str().unwrap(), "insufficient_stock");
    assert!(body["message"].as_str().unwrap().contains("Widget"));

    // Nothing was reserved.
    assert_eq!(product_stock(&client, &srv, &product_id).await, 2);
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_distinguished() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/orders/{}", srv.base_url, uuid::Uuid::now_v7()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/orders/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/orders?status=bogus", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_sku_is_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let admin_token = mint_jwt(jwt_secret, vec![Role::new("admin")]);

    create_product(&client, &srv, &admin_token, 5).await;

    let res = client
        .post(format!("{}/products", srv.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({
            "name": "Widget Clone",
            "sku": "WID01",
            "price": 100,
            "category": "Electronics",
            "stock": 1,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"].as_str().unwrap(), "duplicate");
}
