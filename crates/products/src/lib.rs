//! `stockroom-products` — product catalog records and stock capability.

pub mod product;
pub mod store;

pub use product::{Product, ProductChanges, ProductDraft, Sku};
pub use store::ProductStore;
