//! Reconciliation scenarios against the in-memory backend: order mutations
//! and product stock must always move in lockstep.

use std::sync::Arc;

use chrono::Utc;

use stockroom_auth::{Role, User, UserStore};
use stockroom_core::{OrderId, PageRequest, ProductId, UserId};
use stockroom_orders::{
    CreateOrder, LineItemRequest, OrderError, OrderFilter, OrderService, OrderStatus, UpdateOrder,
};
use stockroom_products::{Product, ProductDraft, ProductStore, Sku};
use stockroom_store::{InMemoryOrderStore, InMemoryProductStore, InMemoryUserStore};

struct Fixture {
    service: OrderService,
    products: Arc<InMemoryProductStore>,
    users: Arc<InMemoryUserStore>,
}

fn fixture() -> Fixture {
    let products = Arc::new(InMemoryProductStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let users = Arc::new(InMemoryUserStore::new());
    let service = OrderService::new(products.clone(), orders, users.clone());
    Fixture {
        service,
        products,
        users,
    }
}

async fn seed_product(f: &Fixture, name: &str, sku: &str, price: u64, stock: i64) -> Product {
    let product = Product::new(
        ProductId::new(),
        ProductDraft {
            name: name.to_string(),
            sku: Sku::new(sku).unwrap(),
            price,
            category: "Electronics".to_string(),
            stock,
            description: None,
        },
        Utc::now(),
    )
    .unwrap();
    f.products.insert(product.clone()).await.unwrap();
    product
}

async fn seed_user(f: &Fixture) -> User {
    let user = User {
        id: UserId::new(),
        email: format!("{}@example.com", UserId::new()),
        name: "Jo Doe".to_string(),
        role: Role::new("user"),
    };
    f.users.insert(user.clone()).await.unwrap();
    user
}

fn line(product: &Product, quantity: i64) -> LineItemRequest {
    LineItemRequest {
        product_id: product.id,
        quantity,
        unit_price: product.price,
    }
}

fn pending(user: &User, line_items: Vec<LineItemRequest>) -> CreateOrder {
    CreateOrder {
        user_id: user.id,
        line_items,
        status: OrderStatus::Pending,
    }
}

async fn stock_of(f: &Fixture, id: ProductId) -> i64 {
    f.products.find_by_id(id).await.unwrap().unwrap().stock
}

#[tokio::test]
async fn create_decrements_stock_for_every_referenced_product() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;
    let b = seed_product(&f, "Gadget", "GAD01", 300, 4).await;

    f.service
        .create_order(pending(&user, vec![line(&a, 3), line(&b, 4)]))
        .await
        .unwrap();

    assert_eq!(stock_of(&f, a.id).await, 7);
    assert_eq!(stock_of(&f, b.id).await, 0);
    assert!(!f.products.find_by_id(b.id).await.unwrap().unwrap().in_stock);
}

#[tokio::test]
async fn failing_create_leaves_all_referenced_stock_unchanged() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;
    let b = seed_product(&f, "Gadget", "GAD01", 300, 2).await;

    // The first line is valid on its own; the second exceeds stock.
    let err = f
        .service
        .create_order(pending(&user, vec![line(&a, 3), line(&b, 5)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    assert_eq!(err.to_string(), "Insufficient stock for product: Gadget");
    assert_eq!(stock_of(&f, a.id).await, 10);
    assert_eq!(stock_of(&f, b.id).await, 2);
}

#[tokio::test]
async fn create_with_unknown_product_fails_without_side_effects() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;
    let ghost = ProductId::new();

    let err = f
        .service
        .create_order(pending(
            &user,
            vec![
                line(&a, 2),
                LineItemRequest {
                    product_id: ghost,
                    quantity: 1,
                    unit_price: 100,
                },
            ],
        ))
        .await
        .unwrap_err();

    match err {
        OrderError::ProductNotFound { product_id } => assert_eq!(product_id, ghost),
        other => panic!("expected ProductNotFound, got {other:?}"),
    }
    assert_eq!(stock_of(&f, a.id).await, 10);
}

#[tokio::test]
async fn create_then_delete_round_trips_stock() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 3)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&f, a.id).await, 7);

    let deleted = f.service.delete_order(view.id).await.unwrap().unwrap();
    assert_eq!(deleted.id, view.id);
    assert_eq!(stock_of(&f, a.id).await, 10);

    // The record really is gone.
    assert!(f.service.get_order(view.id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_decrements_only_the_delta() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 3)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&f, a.id).await, 7);

    f.service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: Some(vec![line(&a, 5)]),
                status: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    // 3 -> 5 takes exactly 2 more units, not 5.
    assert_eq!(stock_of(&f, a.id).await, 5);
}

#[tokio::test]
async fn update_checks_only_incremental_headroom() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 6).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 5)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&f, a.id).await, 1);

    // Bumping 5 -> 6 needs one unit of headroom even though 6 > current stock.
    f.service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: Some(vec![line(&a, 6)]),
                status: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock_of(&f, a.id).await, 0);

    // Bumping 6 -> 8 needs two more units; none are left.
    let err = f
        .service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: Some(vec![line(&a, 8)]),
                status: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    assert_eq!(stock_of(&f, a.id).await, 0);
}

#[tokio::test]
async fn update_dropping_a_product_restores_its_full_quantity() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;
    let b = seed_product(&f, "Gadget", "GAD01", 300, 8).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 4), line(&b, 2)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&f, a.id).await, 6);
    assert_eq!(stock_of(&f, b.id).await, 6);

    let updated = f
        .service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: Some(vec![line(&a, 4)]),
                status: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.line_items.len(), 1);
    assert_eq!(stock_of(&f, a.id).await, 6);
    assert_eq!(stock_of(&f, b.id).await, 8);
}

#[tokio::test]
async fn update_recomputes_total_from_line_items() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 4)]))
        .await
        .unwrap();
    assert_eq!(view.total_amount, 2000);

    let updated = f
        .service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: Some(vec![LineItemRequest {
                    product_id: a.id,
                    quantity: 3,
                    unit_price: 200,
                }]),
                status: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.total_amount, 600);
}

#[tokio::test]
async fn update_without_line_items_touches_status_only() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 4)]))
        .await
        .unwrap();

    let updated = f
        .service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: None,
                status: Some(OrderStatus::Shipped),
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Shipped);
    assert_eq!(updated.line_items.len(), 1);
    assert_eq!(updated.total_amount, 2000);
    assert_eq!(stock_of(&f, a.id).await, 6);
}

#[tokio::test]
async fn update_with_empty_line_items_releases_everything() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 4)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&f, a.id).await, 6);

    let updated = f
        .service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: Some(vec![]),
                status: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert!(updated.line_items.is_empty());
    assert_eq!(updated.total_amount, 0);
    assert_eq!(stock_of(&f, a.id).await, 10);
}

#[tokio::test]
async fn missing_order_signals_absent_result_not_error() {
    let f = fixture();
    let ghost = OrderId::new();

    assert!(f.service.get_order(ghost).await.unwrap().is_none());
    assert!(f.service.delete_order(ghost).await.unwrap().is_none());
    assert!(
        f.service
            .update_order(ghost, UpdateOrder::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn duplicate_lines_beyond_combined_stock_fail_atomically() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    // Each line passes alone; together they want 12 of 10.
    let err = f
        .service
        .create_order(pending(&user, vec![line(&a, 6), line(&a, 6)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    assert_eq!(stock_of(&f, a.id).await, 10);
}

#[tokio::test]
async fn duplicate_lines_within_stock_decrement_by_the_sum() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 4), line(&a, 3)]))
        .await
        .unwrap();

    assert_eq!(view.line_items.len(), 2);
    assert_eq!(view.total_amount, 3500);
    assert_eq!(stock_of(&f, a.id).await, 3);
}

#[tokio::test]
async fn ledger_scenario_create_update_delete() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 4)]))
        .await
        .unwrap();
    assert_eq!(view.total_amount, 2000);
    assert_eq!(stock_of(&f, a.id).await, 6);

    let updated = f
        .service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: Some(vec![line(&a, 2)]),
                status: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.total_amount, 1000);
    assert_eq!(stock_of(&f, a.id).await, 8);

    f.service.delete_order(view.id).await.unwrap().unwrap();
    assert_eq!(stock_of(&f, a.id).await, 10);
}

#[tokio::test]
async fn delete_skips_since_deleted_products() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;
    let b = seed_product(&f, "Gadget", "GAD01", 300, 8).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 2), line(&b, 3)]))
        .await
        .unwrap();

    f.products.delete(b.id).await.unwrap();

    // Restoration is skipped for the removed product, not failed.
    f.service.delete_order(view.id).await.unwrap().unwrap();
    assert_eq!(stock_of(&f, a.id).await, 10);
    assert!(f.products.find_by_id(b.id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_skips_restore_for_since_deleted_products() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;
    let b = seed_product(&f, "Gadget", "GAD01", 300, 8).await;

    let view = f
        .service
        .create_order(pending(&user, vec![line(&a, 2), line(&b, 3)]))
        .await
        .unwrap();

    f.products.delete(b.id).await.unwrap();

    // Dropping the deleted product from the order must not fail the update.
    let updated = f
        .service
        .update_order(
            view.id,
            UpdateOrder {
                line_items: Some(vec![line(&a, 2)]),
                status: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.line_items.len(), 1);
    assert_eq!(stock_of(&f, a.id).await, 8);
}

#[tokio::test]
async fn list_orders_filters_paginates_and_expands() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 100).await;

    for _ in 0..3 {
        f.service
            .create_order(pending(&user, vec![line(&a, 1)]))
            .await
            .unwrap();
    }
    let shipped = f
        .service
        .create_order(CreateOrder {
            user_id: user.id,
            line_items: vec![line(&a, 1)],
            status: OrderStatus::Shipped,
        })
        .await
        .unwrap();

    let all = f
        .service
        .list_orders(OrderFilter::default(), PageRequest::new(1, 3))
        .await
        .unwrap();
    assert_eq!(all.total, 4);
    assert_eq!(all.pages, 2);
    assert_eq!(all.items.len(), 3);
    for pair in all.items.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }

    let only_shipped = f
        .service
        .list_orders(
            OrderFilter {
                status: Some(OrderStatus::Shipped),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(only_shipped.total, 1);
    assert_eq!(only_shipped.items[0].id, shipped.id);

    // Expansion: line items carry their product, the order carries its user.
    let first = &only_shipped.items[0];
    assert_eq!(first.user.as_ref().unwrap().id, user.id);
    assert_eq!(
        first.line_items[0].product.as_ref().unwrap().name,
        "Widget"
    );
}

#[tokio::test]
async fn get_order_expands_references() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let created = f
        .service
        .create_order(pending(&user, vec![line(&a, 1)]))
        .await
        .unwrap();

    let fetched = f.service.get_order(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.user.as_ref().unwrap().email, user.email);
    assert_eq!(fetched.line_items[0].product.as_ref().unwrap().id, a.id);

    // A since-deleted product expands to nothing rather than failing the read.
    f.products.delete(a.id).await.unwrap();
    let fetched = f.service.get_order(created.id).await.unwrap().unwrap();
    assert!(fetched.line_items[0].product.is_none());
}

#[tokio::test]
async fn error_messages_identify_the_offending_product() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Mechanical Keyboard", "KB100", 4500, 1).await;
    let ghost = ProductId::new();

    let err = f
        .service
        .create_order(pending(&user, vec![line(&a, 2)]))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Insufficient stock for product: Mechanical Keyboard"
    );

    let err = f
        .service
        .create_order(pending(
            &user,
            vec![LineItemRequest {
                product_id: ghost,
                quantity: 1,
                unit_price: 1,
            }],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("Product not found: {ghost}"));
}

#[tokio::test]
async fn zero_quantity_line_is_rejected_before_any_stock_movement() {
    let f = fixture();
    let user = seed_user(&f).await;
    let a = seed_product(&f, "Widget", "WID01", 500, 10).await;

    let err = f
        .service
        .create_order(pending(
            &user,
            vec![LineItemRequest {
                product_id: a.id,
                quantity: 0,
                unit_price: 500,
            }],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::Invalid(_)));
    assert_eq!(stock_of(&f, a.id).await, 10);
}
