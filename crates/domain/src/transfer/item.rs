//! Transfer items and their fulfillment states.

use common::{InventoryId, ItemId, ProductId};
use serde::{Deserialize, Serialize};

/// The fulfillment state of a single transfer item.
///
/// Item states trail the parent request's phase: items become `Picked`
/// while the request is `Picking`, `Packed` while it is `Packing`, and
/// follow the request through transit, arrival, and completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    /// Not yet picked.
    #[default]
    Pending,

    /// Picked at the source warehouse.
    Picked,

    /// Packed for shipment.
    Packed,

    /// En route to the destination.
    InTransit,

    /// Arrived at the destination warehouse.
    Arrived,

    /// Stock moved to the destination.
    Completed,
}

impl ItemStatus {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Picked => "Picked",
            ItemStatus::Packed => "Packed",
            ItemStatus::InTransit => "InTransit",
            ItemStatus::Arrived => "Arrived",
            ItemStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single line of a transfer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    /// Unique item identifier.
    pub id: ItemId,

    /// Inventory record the stock is drawn from.
    pub inventory_id: InventoryId,

    /// Product being transferred.
    pub product_id: ProductId,

    /// Stock-keeping unit label.
    pub sku: String,

    /// Quantity requested when the transfer was created.
    pub requested_quantity: u32,

    /// Quantity counted during picking; `None` until recorded.
    pub actual_quantity: Option<u32>,

    /// Current fulfillment state.
    pub status: ItemStatus,
}

impl TransferItem {
    /// Creates a new pending item.
    pub fn new(
        inventory_id: InventoryId,
        product_id: ProductId,
        sku: impl Into<String>,
        requested_quantity: u32,
    ) -> Self {
        Self {
            id: ItemId::new(),
            inventory_id,
            product_id,
            sku: sku.into(),
            requested_quantity,
            actual_quantity: None,
            status: ItemStatus::Pending,
        }
    }

    /// The quantity that actually moves at completion: the picked count
    /// when one was recorded, the requested quantity otherwise.
    pub fn quantity_to_transfer(&self) -> u32 {
        self.actual_quantity.unwrap_or(self.requested_quantity)
    }
}
