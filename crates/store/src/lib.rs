//! `stockroom-store` — backends for the product/order/user store contracts.
//!
//! Two implementations: in-memory (tests/dev) and PostgreSQL.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryOrderStore, InMemoryProductStore, InMemoryUserStore};
pub use postgres::{PgOrderStore, PgProductStore, PgUserStore, ensure_schema};
