//! Inventory service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{InventoryId, ProductId, TransferId, WarehouseId};
use serde::{Deserialize, Serialize};

use super::Fault;
use crate::error::TransferError;

/// An inventory record at a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Inventory record identifier.
    pub id: InventoryId,
    /// Product the stock belongs to.
    pub product_id: ProductId,
    /// Stock-keeping unit label.
    pub sku: String,
    /// Warehouse that owns the stock.
    pub warehouse_id: WarehouseId,
    /// Units currently available for reservation.
    pub available_quantity: u32,
}

impl InventoryRecord {
    /// Creates a new inventory record.
    pub fn new(
        id: InventoryId,
        product_id: ProductId,
        sku: impl Into<String>,
        warehouse_id: WarehouseId,
        available_quantity: u32,
    ) -> Self {
        Self {
            id,
            product_id,
            sku: sku.into(),
            warehouse_id,
            available_quantity,
        }
    }
}

/// A stock movement recorded by the in-memory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub inventory_id: InventoryId,
    pub source: WarehouseId,
    pub destination: WarehouseId,
    pub quantity: u32,
}

/// Trait for inventory stock operations.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Reserves `quantity` units against the record.
    async fn reserve(
        &self,
        inventory_id: InventoryId,
        quantity: u32,
        reason: &str,
        reference: TransferId,
    ) -> Result<(), TransferError>;

    /// Releases a previously made reservation.
    async fn release(
        &self,
        inventory_id: InventoryId,
        quantity: u32,
        reason: &str,
        reference: TransferId,
    ) -> Result<(), TransferError>;

    /// Moves `quantity` units from `source` to `destination`.
    async fn transfer(
        &self,
        inventory_id: InventoryId,
        source: WarehouseId,
        destination: WarehouseId,
        quantity: u32,
        reason: &str,
        reference: TransferId,
    ) -> Result<(), TransferError>;

    /// Fetches an inventory record, failing with
    /// [`TransferError::InventoryNotFound`] if absent.
    async fn get_item(&self, inventory_id: InventoryId) -> Result<InventoryRecord, TransferError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    records: HashMap<InventoryId, InventoryRecord>,
    reserved: Vec<(InventoryId, u32)>,
    released: Vec<(InventoryId, u32)>,
    transferred: Vec<StockMovement>,
    lookups: u32,
    reserve_fault: Fault,
    lookup_fault: Fault,
    transfer_fault: Fault,
    reserve_faults_for: HashMap<InventoryId, u16>,
    release_faults_for: HashMap<InventoryId, u16>,
    transfer_faults_for: HashMap<InventoryId, u16>,
}

/// In-memory inventory service for testing.
///
/// Records every successful call so tests can assert on the exact
/// sequence of reservations, releases, and movements.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryService {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryService {
    /// Creates an empty inventory service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an inventory record for `get_item` lookups.
    pub fn insert_record(&self, record: InventoryRecord) {
        let mut state = self.state.write().unwrap();
        state.records.insert(record.id, record);
    }

    /// Makes the next `times` reserve calls fail with the given status.
    pub fn fail_reserves_with(&self, status: u16, times: u32) {
        self.state.write().unwrap().reserve_fault.arm(status, times);
    }

    /// Makes every reserve call for the given record fail with `status`.
    pub fn fail_reserve_for(&self, inventory_id: InventoryId, status: u16) {
        self.state
            .write()
            .unwrap()
            .reserve_faults_for
            .insert(inventory_id, status);
    }

    /// Makes every release call for the given record fail with `status`.
    pub fn fail_release_for(&self, inventory_id: InventoryId, status: u16) {
        self.state
            .write()
            .unwrap()
            .release_faults_for
            .insert(inventory_id, status);
    }

    /// Makes the next `times` transfer calls fail with the given status.
    pub fn fail_transfers_with(&self, status: u16, times: u32) {
        self.state.write().unwrap().transfer_fault.arm(status, times);
    }

    /// Makes every transfer call for the given record fail with `status`.
    pub fn fail_transfer_for(&self, inventory_id: InventoryId, status: u16) {
        self.state
            .write()
            .unwrap()
            .transfer_faults_for
            .insert(inventory_id, status);
    }

    /// Makes the next `times` `get_item` calls fail with the given status.
    pub fn fail_lookups_with(&self, status: u16, times: u32) {
        self.state.write().unwrap().lookup_fault.arm(status, times);
    }

    /// Returns the number of successful reserve calls.
    pub fn reserve_count(&self) -> usize {
        self.state.read().unwrap().reserved.len()
    }

    /// Returns the number of successful release calls.
    pub fn release_count(&self) -> usize {
        self.state.read().unwrap().released.len()
    }

    /// Returns the number of successful transfer calls.
    pub fn transfer_count(&self) -> usize {
        self.state.read().unwrap().transferred.len()
    }

    /// Returns the number of `get_item` calls, successful or not.
    pub fn lookup_count(&self) -> u32 {
        self.state.read().unwrap().lookups
    }

    /// Returns the successful reserve calls in order.
    pub fn reserved(&self) -> Vec<(InventoryId, u32)> {
        self.state.read().unwrap().reserved.clone()
    }

    /// Returns the successful release calls in order.
    pub fn released(&self) -> Vec<(InventoryId, u32)> {
        self.state.read().unwrap().released.clone()
    }

    /// Returns the successful stock movements in order.
    pub fn transferred(&self) -> Vec<StockMovement> {
        self.state.read().unwrap().transferred.clone()
    }
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    async fn reserve(
        &self,
        inventory_id: InventoryId,
        quantity: u32,
        _reason: &str,
        _reference: TransferId,
    ) -> Result<(), TransferError> {
        let mut state = self.state.write().unwrap();
        if let Some(&status) = state.reserve_faults_for.get(&inventory_id) {
            return Err(TransferError::transport(status, "reserve rejected"));
        }
        if let Some(err) = state.reserve_fault.take("inventory service unavailable") {
            return Err(err);
        }
        state.reserved.push((inventory_id, quantity));
        Ok(())
    }

    async fn release(
        &self,
        inventory_id: InventoryId,
        quantity: u32,
        _reason: &str,
        _reference: TransferId,
    ) -> Result<(), TransferError> {
        let mut state = self.state.write().unwrap();
        if let Some(&status) = state.release_faults_for.get(&inventory_id) {
            return Err(TransferError::transport(status, "release rejected"));
        }
        state.released.push((inventory_id, quantity));
        Ok(())
    }

    async fn transfer(
        &self,
        inventory_id: InventoryId,
        source: WarehouseId,
        destination: WarehouseId,
        quantity: u32,
        _reason: &str,
        _reference: TransferId,
    ) -> Result<(), TransferError> {
        let mut state = self.state.write().unwrap();
        if let Some(&status) = state.transfer_faults_for.get(&inventory_id) {
            return Err(TransferError::transport(status, "transfer rejected"));
        }
        if let Some(err) = state.transfer_fault.take("inventory service unavailable") {
            return Err(err);
        }
        state.transferred.push(StockMovement {
            inventory_id,
            source,
            destination,
            quantity,
        });
        Ok(())
    }

    async fn get_item(&self, inventory_id: InventoryId) -> Result<InventoryRecord, TransferError> {
        let mut state = self.state.write().unwrap();
        state.lookups += 1;
        if let Some(err) = state.lookup_fault.take("inventory service unavailable") {
            return Err(err);
        }
        state
            .records
            .get(&inventory_id)
            .cloned()
            .ok_or(TransferError::InventoryNotFound(inventory_id))
    }
}
