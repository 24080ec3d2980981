//! `stockroom-api` — HTTP surface for the order ledger and product catalog.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
