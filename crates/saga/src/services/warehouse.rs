//! Warehouse directory trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::WarehouseId;
use serde::{Deserialize, Serialize};

use super::Fault;
use crate::error::TransferError;

/// A warehouse known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseRecord {
    /// Warehouse identifier.
    pub id: WarehouseId,
    /// Human-readable warehouse name.
    pub name: String,
}

impl WarehouseRecord {
    /// Creates a new warehouse record.
    pub fn new(id: WarehouseId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Trait for looking up warehouses.
#[async_trait]
pub trait WarehouseDirectory: Send + Sync {
    /// Returns true if a warehouse exists with the given ID.
    async fn exists(&self, warehouse_id: WarehouseId) -> Result<bool, TransferError>;

    /// Fetches a warehouse record, failing with
    /// [`TransferError::WarehouseNotFound`] if absent.
    async fn get(&self, warehouse_id: WarehouseId) -> Result<WarehouseRecord, TransferError>;
}

#[derive(Debug, Default)]
struct InMemoryDirectoryState {
    warehouses: HashMap<WarehouseId, WarehouseRecord>,
    lookup_fault: Fault,
}

/// In-memory warehouse directory for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarehouseDirectory {
    state: Arc<RwLock<InMemoryDirectoryState>>,
}

impl InMemoryWarehouseDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a warehouse.
    pub fn insert(&self, record: WarehouseRecord) {
        let mut state = self.state.write().unwrap();
        state.warehouses.insert(record.id, record);
    }

    /// Makes the next `times` lookups fail with the given transport status.
    pub fn fail_lookups_with(&self, status: u16, times: u32) {
        self.state.write().unwrap().lookup_fault.arm(status, times);
    }
}

#[async_trait]
impl WarehouseDirectory for InMemoryWarehouseDirectory {
    async fn exists(&self, warehouse_id: WarehouseId) -> Result<bool, TransferError> {
        let mut state = self.state.write().unwrap();
        if let Some(err) = state.lookup_fault.take("warehouse directory unavailable") {
            return Err(err);
        }
        Ok(state.warehouses.contains_key(&warehouse_id))
    }

    async fn get(&self, warehouse_id: WarehouseId) -> Result<WarehouseRecord, TransferError> {
        let mut state = self.state.write().unwrap();
        if let Some(err) = state.lookup_fault.take("warehouse directory unavailable") {
            return Err(err);
        }
        state
            .warehouses
            .get(&warehouse_id)
            .cloned()
            .ok_or(TransferError::WarehouseNotFound(warehouse_id))
    }
}
