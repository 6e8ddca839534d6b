// storefront/src/models/mod.rs

//! Row types as stored in Postgres, and their conversion into core values.

pub mod order;
pub mod product;

pub use order::{OrderItemRow, OrderRow};
pub use product::ProductRow;
