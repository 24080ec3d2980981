//! Order reconciliation service.
//!
//! Mediates between the order ledger and the product catalog so that stock
//! mutations and order line items always move in lockstep. Every mutation
//! runs its existence and stock checks against in-memory working copies
//! before the first store write: a failing request leaves every product's
//! stored stock unchanged.
//!
//! There is no cross-request isolation — two concurrent mutations of the
//! same product can still interleave between read and write. The store
//! contracts keep `save` whole-record so a conditional decrement can be
//! introduced behind the same seam.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use stockroom_auth::UserStore;
use stockroom_core::{DomainError, OrderId, Page, PageRequest, ProductId, StoreError, UserId};
use stockroom_products::{Product, ProductStore};

use crate::order::{Order, OrderLineItem, OrderStatus};
use crate::store::{OrderFilter, OrderStore};
use crate::view::OrderView;

/// Errors surfaced by order mutations.
///
/// A missing *order* is not an error: get/update/delete signal it as an
/// absent result.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// The requested quantity (or incremental delta, on update) exceeds the
    /// product's available stock.
    #[error("Insufficient stock for product: {product}")]
    InsufficientStock { product: String },

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One requested line: product, quantity, caller-snapshotted unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: u64,
}

/// Input for `create_order`. The total is always recomputed server-side
/// from the line items, so no caller-supplied total is accepted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    pub user_id: UserId,
    pub line_items: Vec<LineItemRequest>,
    pub status: OrderStatus,
}

/// Input for `update_order`.
///
/// `line_items: None` leaves the order's items and all stock untouched;
/// `Some(vec![])` removes every item and restores its stock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOrder {
    pub line_items: Option<Vec<LineItemRequest>>,
    pub status: Option<OrderStatus>,
}

/// The reconciliation service over the three store contracts.
#[derive(Clone)]
pub struct OrderService {
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserStore>,
}

impl OrderService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            products,
            orders,
            users,
        }
    }

    /// List orders, optionally filtered by status, newest first, expanded.
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<OrderView>, OrderError> {
        let orders = self.orders.find(&filter, page.skip(), page.limit).await?;
        let total = self.orders.count(&filter).await?;

        let mut items = Vec::with_capacity(orders.len());
        for order in orders {
            items.push(self.expand(order).await?);
        }

        Ok(Page::new(items, total, page))
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Option<OrderView>, OrderError> {
        match self.orders.find_by_id(id).await? {
            Some(order) => Ok(Some(self.expand(order).await?)),
            None => Ok(None),
        }
    }

    /// Create an order, reserving stock for every line item.
    ///
    /// Line items are applied sequentially against working copies of the
    /// batch-resolved products, so duplicate lines for one product fail when
    /// their combined quantity exceeds its stock. Nothing is persisted until
    /// every line has passed.
    pub async fn create_order(&self, request: CreateOrder) -> Result<OrderView, OrderError> {
        if request.line_items.is_empty() {
            return Err(DomainError::validation("order must contain at least one line item").into());
        }

        let ids: Vec<ProductId> = request.line_items.iter().map(|li| li.product_id).collect();
        let mut working = self.resolve(&ids).await?;

        let mut line_items = Vec::with_capacity(request.line_items.len());
        for requested in &request.line_items {
            let product = working
                .get_mut(&requested.product_id)
                .ok_or(OrderError::ProductNotFound {
                    product_id: requested.product_id,
                })?;

            let item =
                OrderLineItem::new(requested.product_id, requested.quantity, requested.unit_price)?;

            if product.reserve(requested.quantity).is_err() {
                return Err(OrderError::InsufficientStock {
                    product: product.name.clone(),
                });
            }

            line_items.push(item);
        }

        self.persist_working(&ids, &working).await?;

        let order = Order::new(
            OrderId::new(),
            request.user_id,
            line_items,
            request.status,
            Utc::now(),
        );
        self.orders.insert(order.clone()).await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            lines = order.line_items.len(),
            total_amount = order.total_amount,
            "order created"
        );

        Ok(self.expand(order).await?)
    }

    /// Update an order, reconciling stock against its previous line items.
    ///
    /// Per product only the incremental delta is checked against stock: a
    /// line going from 5 to 6 needs one unit of headroom, and a line edited
    /// down releases the difference. Products dropped from the order get
    /// their full previously-committed quantity restored. The total is
    /// recomputed from the new line items; any caller-supplied total is
    /// ignored.
    pub async fn update_order(
        &self,
        id: OrderId,
        request: UpdateOrder,
    ) -> Result<Option<OrderView>, OrderError> {
        let Some(mut order) = self.orders.find_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(new_items) = request.line_items {
            let mut previous: HashMap<ProductId, i64> = order
                .line_items
                .iter()
                .map(|item| (item.product_id, item.quantity))
                .collect();

            let ids: Vec<ProductId> = new_items.iter().map(|li| li.product_id).collect();
            let mut working = self.resolve(&ids).await?;

            let mut rebuilt = Vec::with_capacity(new_items.len());
            for requested in &new_items {
                let product = working.get_mut(&requested.product_id).ok_or(
                    OrderError::ProductNotFound {
                        product_id: requested.product_id,
                    },
                )?;

                let item = OrderLineItem::new(
                    requested.product_id,
                    requested.quantity,
                    requested.unit_price,
                )?;

                let committed = previous.remove(&requested.product_id).unwrap_or(0);
                let delta = requested.quantity - committed;
                if delta > 0 {
                    if product.reserve(delta).is_err() {
                        return Err(OrderError::InsufficientStock {
                            product: product.name.clone(),
                        });
                    }
                } else if delta < 0 {
                    product.release(-delta);
                }

                rebuilt.push(item);
            }

            // Products no longer on the order: give their committed units back.
            // A product deleted since the order was written is skipped rather
            // than failing the whole update.
            let mut restored = Vec::new();
            for (product_id, committed) in previous {
                match self.products.find_by_id(product_id).await? {
                    Some(mut product) => {
                        product.release(committed);
                        restored.push(product);
                    }
                    None => {
                        debug!(%product_id, "skipping stock restore for missing product");
                    }
                }
            }

            self.persist_working(&ids, &working).await?;
            for product in &restored {
                self.products.save(product).await?;
            }

            order.line_items = rebuilt;
            order.total_amount = Order::total_of(&order.line_items);
        }

        if let Some(status) = request.status {
            order.status = status;
        }

        self.orders.save(&order).await?;

        info!(
            order_id = %order.id,
            lines = order.line_items.len(),
            total_amount = order.total_amount,
            status = order.status.as_str(),
            "order updated"
        );

        Ok(Some(self.expand(order).await?))
    }

    /// Delete an order, restoring every line item's quantity to stock.
    ///
    /// Products deleted since the order was written are skipped. Returns the
    /// order's last-known state, or `None` when the id is unknown.
    pub async fn delete_order(&self, id: OrderId) -> Result<Option<OrderView>, OrderError> {
        let Some(order) = self.orders.find_by_id(id).await? else {
            return Ok(None);
        };

        for item in &order.line_items {
            match self.products.find_by_id(item.product_id).await? {
                Some(mut product) => {
                    product.release(item.quantity);
                    self.products.save(&product).await?;
                }
                None => {
                    debug!(product_id = %item.product_id, "skipping stock restore for missing product");
                }
            }
        }

        self.orders.delete(order.id).await?;

        info!(order_id = %order.id, lines = order.line_items.len(), "order deleted");

        Ok(Some(self.expand(order).await?))
    }

    /// Batch-resolve products into per-request working copies keyed by id.
    async fn resolve(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Product>, OrderError> {
        let found = self.products.find_by_ids(ids).await?;
        Ok(found.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Persist each working copy once, in first-reference order.
    async fn persist_working(
        &self,
        ids: &[ProductId],
        working: &HashMap<ProductId, Product>,
    ) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            if let Some(product) = working.get(id) {
                self.products.save(product).await?;
            }
        }
        Ok(())
    }

    /// Expand an order with its line items' products and owning user.
    async fn expand(&self, order: Order) -> Result<OrderView, StoreError> {
        let ids: Vec<ProductId> = order.line_items.iter().map(|li| li.product_id).collect();
        let products: HashMap<ProductId, Product> = self
            .products
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let user = self.users.find_by_id(order.user_id).await?;

        Ok(OrderView::assemble(order, &products, user))
    }
}
