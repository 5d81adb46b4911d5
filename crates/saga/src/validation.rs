//! Pre-flight validation of transfer requests.

use std::collections::HashMap;

use common::{InventoryId, WarehouseId};
use domain::TransferRequest;

use crate::error::TransferError;
use crate::services::{InventoryRecord, InventoryService, WarehouseDirectory, WarehouseRecord};

/// Outcome of validating a transfer request.
///
/// Collects every rule violation as a human-readable string instead of
/// failing on the first one, and stashes the collaborator records
/// fetched along the way so callers can reuse them without re-fetching.
/// Constructed fresh per validation call, never persisted.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<String>,
    warehouses: HashMap<WarehouseId, WarehouseRecord>,
    inventory: HashMap<InventoryId, InventoryRecord>,
}

impl ValidationResult {
    /// Returns true if no rule was violated.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the collected errors in the order they were found.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Returns a warehouse record fetched during validation.
    pub fn warehouse(&self, warehouse_id: WarehouseId) -> Option<&WarehouseRecord> {
        self.warehouses.get(&warehouse_id)
    }

    /// Returns an inventory record fetched during validation.
    pub fn inventory(&self, inventory_id: InventoryId) -> Option<&InventoryRecord> {
        self.inventory.get(&inventory_id)
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validates transfer requests against the warehouse directory and the
/// inventory service before they enter the workflow.
///
/// Stateless: holds only the injected collaborators, so calls for
/// different transfers are independently parallelizable.
pub struct TransferValidator<W, I> {
    warehouses: W,
    inventory: I,
}

impl<W, I> TransferValidator<W, I>
where
    W: WarehouseDirectory,
    I: InventoryService,
{
    /// Creates a validator over the given collaborators.
    pub fn new(warehouses: W, inventory: I) -> Self {
        Self {
            warehouses,
            inventory,
        }
    }

    /// Runs the structural pass and, only when it finds nothing wrong,
    /// the cross-service pass.
    ///
    /// All violations are collected; collaborator failures become error
    /// strings, never early returns, so the caller always receives a
    /// structured result.
    #[tracing::instrument(skip_all, fields(transfer_id = %request.id()))]
    pub async fn validate(&self, request: &TransferRequest) -> ValidationResult {
        let mut result = ValidationResult::default();

        check_structure(request, &mut result);
        if result.is_valid() {
            self.check_warehouses(request, &mut result).await;
            self.check_inventory(request, &mut result).await;
        }

        if !result.is_valid() {
            tracing::debug!(errors = result.errors().len(), "transfer failed validation");
        }
        result
    }

    async fn check_warehouses(&self, request: &TransferRequest, result: &mut ValidationResult) {
        let lookups = [
            ("source", request.source_warehouse_id()),
            ("destination", request.destination_warehouse_id()),
        ];
        for (label, warehouse_id) in lookups {
            match self.warehouses.get(warehouse_id).await {
                Ok(record) => {
                    result.warehouses.insert(warehouse_id, record);
                }
                Err(TransferError::WarehouseNotFound(_)) => {
                    result.error(format!("{label} warehouse {warehouse_id} does not exist"));
                }
                Err(err) => {
                    result.error(format!(
                        "{label} warehouse lookup failed for {warehouse_id}: {err}"
                    ));
                }
            }
        }
    }

    async fn check_inventory(&self, request: &TransferRequest, result: &mut ValidationResult) {
        for (index, item) in request.items().iter().enumerate() {
            match self.inventory.get_item(item.inventory_id).await {
                Ok(record) => {
                    if record.warehouse_id != request.source_warehouse_id() {
                        result.error(format!(
                            "item {index}: inventory {} belongs to warehouse {}, not source warehouse {}",
                            item.inventory_id,
                            record.warehouse_id,
                            request.source_warehouse_id()
                        ));
                    }
                    if record.available_quantity < item.requested_quantity {
                        result.error(format!(
                            "item {index}: insufficient quantity for inventory {}: available {}, requested {}",
                            item.inventory_id, record.available_quantity, item.requested_quantity
                        ));
                    }
                    result.inventory.insert(item.inventory_id, record);
                }
                Err(TransferError::InventoryNotFound(_)) => {
                    result.error(format!(
                        "item {index}: inventory {} does not exist",
                        item.inventory_id
                    ));
                }
                Err(err) => {
                    result.error(format!(
                        "item {index}: inventory lookup failed for {}: {err}",
                        item.inventory_id
                    ));
                }
            }
        }
    }
}

/// Structural checks: no external calls, every violation collected.
fn check_structure(request: &TransferRequest, result: &mut ValidationResult) {
    if request.source_warehouse_id() == request.destination_warehouse_id() {
        result.error(format!(
            "source and destination warehouse are the same: {}",
            request.source_warehouse_id()
        ));
    }
    if request.items().is_empty() {
        result.error("transfer has no items");
    }
    for (index, item) in request.items().iter().enumerate() {
        if item.sku.trim().is_empty() {
            result.error(format!("item {index}: SKU is blank"));
        }
        if item.requested_quantity == 0 {
            result.error(format!(
                "item {index}: requested quantity must be greater than zero"
            ));
        }
    }
}
