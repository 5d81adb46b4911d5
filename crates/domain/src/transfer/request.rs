//! Transfer request aggregate.

use chrono::{DateTime, Utc};
use common::{ItemId, TransferId, WarehouseId};
use serde::{Deserialize, Serialize};

use super::{ItemStatus, TransferItem, TransferStatus};

/// A cross-warehouse transfer request.
///
/// The item collection is fixed at construction: quantities and statuses
/// mutate during fulfillment, items are never added or removed. Status
/// transitions are driven by the workflow coordinator; the aggregate
/// itself only records them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Unique transfer identifier.
    id: TransferId,

    /// External correlation string.
    reference_number: String,

    /// Warehouse the stock leaves.
    source_warehouse_id: WarehouseId,

    /// Warehouse the stock arrives at.
    destination_warehouse_id: WarehouseId,

    /// Current lifecycle state.
    status: TransferStatus,

    /// Ordered items, fixed in membership after creation.
    items: Vec<TransferItem>,

    /// Carrier handling the shipment, set at pickup.
    carrier_id: Option<String>,

    /// Carrier tracking number, set at pickup.
    tracking_number: Option<String>,

    /// Shipping label location, set at pickup.
    shipping_label_url: Option<String>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransferRequest {
    /// Creates a new transfer request awaiting approval.
    pub fn new(
        id: TransferId,
        reference_number: impl Into<String>,
        source_warehouse_id: WarehouseId,
        destination_warehouse_id: WarehouseId,
        items: Vec<TransferItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            reference_number: reference_number.into(),
            source_warehouse_id,
            destination_warehouse_id,
            status: TransferStatus::PendingApproval,
            items,
            carrier_id: None,
            tracking_number: None,
            shipping_label_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// Query methods
impl TransferRequest {
    /// Returns the transfer ID.
    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Returns the external correlation string.
    pub fn reference_number(&self) -> &str {
        &self.reference_number
    }

    /// Returns the source warehouse ID.
    pub fn source_warehouse_id(&self) -> WarehouseId {
        self.source_warehouse_id
    }

    /// Returns the destination warehouse ID.
    pub fn destination_warehouse_id(&self) -> WarehouseId {
        self.destination_warehouse_id
    }

    /// Returns the current lifecycle state.
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// Returns the items in request order.
    pub fn items(&self) -> &[TransferItem] {
        &self.items
    }

    /// Returns an item by ID.
    pub fn item(&self, item_id: ItemId) -> Option<&TransferItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Returns the carrier ID, if set.
    pub fn carrier_id(&self) -> Option<&str> {
        self.carrier_id.as_deref()
    }

    /// Returns the tracking number, if set.
    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    /// Returns the shipping label URL, if set.
    pub fn shipping_label_url(&self) -> Option<&str> {
        self.shipping_label_url.as_deref()
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if every item is in the given state.
    pub fn all_items_have_status(&self, status: ItemStatus) -> bool {
        self.items.iter().all(|item| item.status == status)
    }

    /// Returns how many items are not yet in the given state.
    pub fn items_not_in_status(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status != status).count()
    }
}

// Mutators, used by the persistence collaborator.
impl TransferRequest {
    /// Records a new lifecycle state.
    pub fn set_status(&mut self, status: TransferStatus) {
        self.status = status;
        self.touch();
    }

    /// Records the carrier hand-off details.
    pub fn set_tracking(&mut self, carrier_id: &str, tracking_number: &str, label_url: &str) {
        self.carrier_id = Some(carrier_id.to_string());
        self.tracking_number = Some(tracking_number.to_string());
        self.shipping_label_url = Some(label_url.to_string());
        self.touch();
    }

    /// Records a new state for one item. Returns false if the transfer
    /// has no item with the given ID.
    pub fn set_item_status(&mut self, item_id: ItemId, status: ItemStatus) -> bool {
        match self.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.status = status;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Records the quantity counted during picking. Returns false if the
    /// transfer has no item with the given ID.
    pub fn set_item_actual_quantity(&mut self, item_id: ItemId, quantity: u32) -> bool {
        match self.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.actual_quantity = Some(quantity);
                self.touch();
                true
            }
            None => false,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
