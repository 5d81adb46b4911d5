//! Shared identifier types for the warehouse transfer system.

mod types;

pub use types::{InventoryId, ItemId, ProductId, TransferId, WarehouseId};
