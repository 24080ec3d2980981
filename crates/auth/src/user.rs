use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use stockroom_core::{StoreError, UserId};

use crate::Role;

/// User record: the owning side of an order.
///
/// Identity issuance (registration, passwords) is handled outside this
/// system; orders reference users by id and expand them on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Store contract for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: User) -> Result<(), StoreError>;
}
