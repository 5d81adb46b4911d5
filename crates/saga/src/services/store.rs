//! Transfer persistence trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ItemId, TransferId};
use domain::{ItemStatus, TransferRequest, TransferStatus};

use super::Fault;
use crate::error::TransferError;

/// Trait for reading and writing transfer state.
///
/// Implementations must provide atomic read-modify-write semantics per
/// transfer id (optimistic versioning or a per-id lock) so that two
/// concurrent transitions on the same transfer cannot race. The
/// coordinator relies on this invariant instead of serializing calls
/// itself.
#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Fetches a transfer, failing with
    /// [`TransferError::TransferNotFound`] if absent.
    async fn get(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError>;

    /// Records a new lifecycle state and returns the updated transfer.
    async fn set_status(
        &self,
        transfer_id: TransferId,
        status: TransferStatus,
    ) -> Result<TransferRequest, TransferError>;

    /// Records a new state for one item.
    async fn set_item_status(
        &self,
        transfer_id: TransferId,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<(), TransferError>;

    /// Records the quantity counted for one item during picking.
    async fn set_item_actual_quantity(
        &self,
        transfer_id: TransferId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), TransferError>;

    /// Records the carrier hand-off details.
    async fn set_tracking(
        &self,
        transfer_id: TransferId,
        carrier_id: &str,
        tracking_number: &str,
        label_url: &str,
    ) -> Result<(), TransferError>;

    /// Marks the transfer cancelled and returns the updated transfer.
    async fn cancel(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError>;
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    transfers: HashMap<TransferId, TransferRequest>,
    status_fault: Fault,
    item_status_fault: Fault,
    tracking_fault: Fault,
}

/// In-memory transfer store for testing.
///
/// A single lock over the map gives every mutation atomic
/// read-modify-write semantics per transfer id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransferStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

impl InMemoryTransferStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transfer to the store.
    pub fn insert(&self, transfer: TransferRequest) {
        let mut state = self.state.write().unwrap();
        state.transfers.insert(transfer.id(), transfer);
    }

    /// Makes the next `times` `set_status` calls fail with the given status.
    pub fn fail_set_status_with(&self, status: u16, times: u32) {
        self.state.write().unwrap().status_fault.arm(status, times);
    }

    /// Makes the next `times` `set_item_status` calls fail with the given
    /// status.
    pub fn fail_set_item_status_with(&self, status: u16, times: u32) {
        self.state
            .write()
            .unwrap()
            .item_status_fault
            .arm(status, times);
    }

    /// Makes the next `times` `set_tracking` calls fail with the given
    /// status.
    pub fn fail_set_tracking_with(&self, status: u16, times: u32) {
        self.state.write().unwrap().tracking_fault.arm(status, times);
    }
}

#[async_trait]
impl TransferStore for InMemoryTransferStore {
    async fn get(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError> {
        let state = self.state.read().unwrap();
        state
            .transfers
            .get(&transfer_id)
            .cloned()
            .ok_or(TransferError::TransferNotFound(transfer_id))
    }

    async fn set_status(
        &self,
        transfer_id: TransferId,
        status: TransferStatus,
    ) -> Result<TransferRequest, TransferError> {
        let mut state = self.state.write().unwrap();
        if let Some(err) = state.status_fault.take("transfer store unavailable") {
            return Err(err);
        }
        let transfer = state
            .transfers
            .get_mut(&transfer_id)
            .ok_or(TransferError::TransferNotFound(transfer_id))?;
        transfer.set_status(status);
        Ok(transfer.clone())
    }

    async fn set_item_status(
        &self,
        transfer_id: TransferId,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<(), TransferError> {
        let mut state = self.state.write().unwrap();
        if let Some(err) = state.item_status_fault.take("transfer store unavailable") {
            return Err(err);
        }
        let transfer = state
            .transfers
            .get_mut(&transfer_id)
            .ok_or(TransferError::TransferNotFound(transfer_id))?;
        if !transfer.set_item_status(item_id, status) {
            return Err(TransferError::ItemNotFound {
                transfer: transfer_id,
                item: item_id,
            });
        }
        Ok(())
    }

    async fn set_item_actual_quantity(
        &self,
        transfer_id: TransferId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), TransferError> {
        let mut state = self.state.write().unwrap();
        let transfer = state
            .transfers
            .get_mut(&transfer_id)
            .ok_or(TransferError::TransferNotFound(transfer_id))?;
        if !transfer.set_item_actual_quantity(item_id, quantity) {
            return Err(TransferError::ItemNotFound {
                transfer: transfer_id,
                item: item_id,
            });
        }
        Ok(())
    }

    async fn set_tracking(
        &self,
        transfer_id: TransferId,
        carrier_id: &str,
        tracking_number: &str,
        label_url: &str,
    ) -> Result<(), TransferError> {
        let mut state = self.state.write().unwrap();
        if let Some(err) = state.tracking_fault.take("transfer store unavailable") {
            return Err(err);
        }
        let transfer = state
            .transfers
            .get_mut(&transfer_id)
            .ok_or(TransferError::TransferNotFound(transfer_id))?;
        transfer.set_tracking(carrier_id, tracking_number, label_url);
        Ok(())
    }

    async fn cancel(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError> {
        let mut state = self.state.write().unwrap();
        let transfer = state
            .transfers
            .get_mut(&transfer_id)
            .ok_or(TransferError::TransferNotFound(transfer_id))?;
        transfer.set_status(TransferStatus::Cancelled);
        Ok(transfer.clone())
    }
}
