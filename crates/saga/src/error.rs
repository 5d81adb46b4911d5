//! Transfer error types.

use common::{InventoryId, ItemId, TransferId, WarehouseId};
use domain::{ItemStatus, TransferStatus};
use thiserror::Error;

/// Errors that can occur during transfer operations.
///
/// Structural and business-rule violations are not represented here:
/// validation collects those as data in a
/// [`ValidationResult`](crate::ValidationResult) instead of raising.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Operation invoked against the wrong lifecycle state.
    #[error("Invalid transfer state: expected {expected}, actual {actual}")]
    InvalidState {
        expected: String,
        actual: TransferStatus,
    },

    /// A phase cannot close because items are not in the required state.
    #[error("Cannot move transfer to {target}: {pending} of {total} items are not yet {expected}")]
    ItemsNotReady {
        target: TransferStatus,
        expected: ItemStatus,
        pending: usize,
        total: usize,
    },

    /// An item is in the wrong state for an item-level operation.
    #[error("Item {item} is {actual}, expected {expected}")]
    InvalidItemState {
        item: ItemId,
        expected: ItemStatus,
        actual: ItemStatus,
    },

    /// Transfer not found.
    #[error("Transfer not found: {0}")]
    TransferNotFound(TransferId),

    /// Warehouse not found in the directory.
    #[error("Warehouse not found: {0}")]
    WarehouseNotFound(WarehouseId),

    /// Inventory record not found.
    #[error("Inventory record not found: {0}")]
    InventoryNotFound(InventoryId),

    /// Transfer has no item with the given ID.
    #[error("Transfer {transfer} has no item {item}")]
    ItemNotFound { transfer: TransferId, item: ItemId },

    /// Transport-level collaborator failure carrying an HTTP-style status code.
    #[error("Transport failure (status {status}): {message}")]
    Transport { status: u16, message: String },

    /// A non-retryable collaborator failure or an exhausted retry budget,
    /// wrapping the original cause.
    #[error("{description}")]
    Integration {
        description: String,
        #[source]
        source: Box<TransferError>,
    },
}

impl TransferError {
    /// Status codes treated as transient faults.
    const RETRYABLE_STATUSES: [u16; 4] = [429, 502, 503, 504];

    /// Creates a transport-level failure with the given status code.
    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        TransferError::Transport {
            status,
            message: message.into(),
        }
    }

    /// Wraps a failure in an integration error carrying a description of
    /// the operation that failed.
    pub fn integration(description: impl Into<String>, source: TransferError) -> Self {
        TransferError::Integration {
            description: description.into(),
            source: Box::new(source),
        }
    }

    /// Returns true for transport-level failures worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::Transport { status, .. } if Self::RETRYABLE_STATUSES.contains(status)
        )
    }
}

/// Convenience type alias for transfer results.
pub type Result<T> = std::result::Result<T, TransferError>;
