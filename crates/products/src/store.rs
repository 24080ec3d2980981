use async_trait::async_trait;

use stockroom_core::{ProductId, StoreError};

use crate::product::{Product, Sku};

/// Store contract for the product catalog.
///
/// The reconciliation service needs only `find_by_ids`/`find_by_id`/`save`;
/// the remaining operations back the catalog management routes.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Batch lookup. Ids with no matching record are simply absent from the
    /// result; callers decide whether that is an error.
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, StoreError>;

    /// List products, newest first.
    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<Product>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Insert a new record; duplicate SKUs yield [`StoreError::Duplicate`].
    async fn insert(&self, product: Product) -> Result<(), StoreError>;

    /// Persist the current state of an existing record.
    async fn save(&self, product: &Product) -> Result<(), StoreError>;

    /// Delete a record; returns whether it existed.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;
}
