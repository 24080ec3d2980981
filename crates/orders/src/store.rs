use async_trait::async_trait;

use stockroom_core::{OrderId, StoreError};

use crate::order::{Order, OrderStatus};

/// Filter for order listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self.status {
            Some(status) => order.status == status,
            None => true,
        }
    }
}

/// Store contract for order records.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch a window of orders matching `filter`, creation time descending.
    async fn find(
        &self,
        filter: &OrderFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Order>, StoreError>;

    async fn count(&self, filter: &OrderFilter) -> Result<u64, StoreError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn insert(&self, order: Order) -> Result<(), StoreError>;

    async fn save(&self, order: &Order) -> Result<(), StoreError>;

    async fn delete(&self, id: OrderId) -> Result<(), StoreError>;
}
