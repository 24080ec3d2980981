//! `stockroom-orders` — the stock-reconciling order ledger.
//!
//! Order create/update/delete are also stock mutation transactions against
//! the product catalog: every unit committed by an active order is a unit
//! removed from available stock, and every unit released is a unit returned.
//! [`service::OrderService`] holds that invariant.

pub mod order;
pub mod service;
pub mod store;
pub mod view;

pub use order::{Order, OrderLineItem, OrderStatus};
pub use service::{CreateOrder, LineItemRequest, OrderError, OrderService, UpdateOrder};
pub use store::{OrderFilter, OrderStore};
pub use view::{LineItemView, OrderView};
