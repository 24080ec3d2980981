//! In-memory store backends.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use stockroom_auth::{User, UserStore};
use stockroom_core::{OrderId, ProductId, StoreError, UserId};
use stockroom_orders::{Order, OrderFilter, OrderStore};
use stockroom_products::{Product, ProductStore, Sku};

fn poisoned() -> StoreError {
    StoreError::backend("lock poisoned")
}

#[derive(Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let wanted: HashSet<ProductId> = ids.iter().copied().collect();
        Ok(map
            .values()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|p| &p.sku == sku).cloned())
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut products: Vec<Product> = map.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.len() as u64)
    }

    async fn insert(&self, product: Product) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::duplicate(format!("sku {}", product.sku)));
        }
        if map.contains_key(&product.id) {
            return Err(StoreError::duplicate(format!("product {}", product.id)));
        }
        map.insert(product.id, product);
        Ok(())
    }

    async fn save(&self, product: &Product) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find(
        &self,
        filter: &OrderFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Order>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut orders: Vec<Order> = map.values().filter(|o| filter.matches(o)).cloned().collect();
        // Creation time descending; order ids are time-ordered (UUIDv7) so
        // they break ties deterministically.
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().filter(|o| filter.matches(o)).count() as u64)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn insert(&self, order: Order) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&order.id) {
            return Err(StoreError::duplicate(format!("order {}", order.id)));
        }
        map.insert(order.id, order);
        Ok(())
    }

    async fn save(&self, order: &Order) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(order.id, order.clone());
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|u| u.email == user.email) {
            return Err(StoreError::duplicate(format!("email {}", user.email)));
        }
        map.insert(user.id, user);
        Ok(())
    }
}
