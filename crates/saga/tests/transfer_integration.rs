//! Integration tests for the cross-warehouse transfer saga.

use common::{InventoryId, ProductId, TransferId, WarehouseId};
use domain::{ItemStatus, TransferItem, TransferRequest, TransferStatus};
use saga::{
    InMemoryInventoryService, InMemoryTransferStore, InMemoryWarehouseDirectory, InventoryRecord,
    RetryConfig, TransferCoordinator, TransferError, TransferValidator, WarehouseRecord,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

type TestCoordinator = TransferCoordinator<InMemoryTransferStore, InMemoryInventoryService>;
type TestValidator = TransferValidator<InMemoryWarehouseDirectory, InMemoryInventoryService>;

struct TestHarness {
    coordinator: TestCoordinator,
    validator: TestValidator,
    store: InMemoryTransferStore,
    inventory: InMemoryInventoryService,
    source: WarehouseId,
    destination: WarehouseId,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryTransferStore::new();
        let inventory = InMemoryInventoryService::new();
        let directory = InMemoryWarehouseDirectory::new();
        let source = WarehouseId::new();
        let destination = WarehouseId::new();
        directory.insert(WarehouseRecord::new(source, "North DC"));
        directory.insert(WarehouseRecord::new(destination, "South DC"));

        let coordinator =
            TransferCoordinator::new(store.clone(), inventory.clone(), RetryConfig::default());
        let validator = TransferValidator::new(directory, inventory.clone());

        Self {
            coordinator,
            validator,
            store,
            inventory,
            source,
            destination,
        }
    }

    /// Creates a transfer whose items all have stock at the source.
    fn create_transfer(&self, quantities: &[u32]) -> TransferRequest {
        let items: Vec<TransferItem> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| {
                let item =
                    TransferItem::new(InventoryId::new(), ProductId::new(), format!("SKU-{i:03}"), q);
                self.inventory.insert_record(InventoryRecord::new(
                    item.inventory_id,
                    item.product_id,
                    item.sku.clone(),
                    self.source,
                    q + 10,
                ));
                item
            })
            .collect();

        let transfer = TransferRequest::new(
            TransferId::new(),
            "TRF-2024-0001",
            self.source,
            self.destination,
            items,
        );
        self.store.insert(transfer.clone());
        transfer
    }

    async fn status(&self, transfer_id: TransferId) -> TransferStatus {
        use saga::TransferStore;
        self.store.get(transfer_id).await.unwrap().status()
    }
}

#[tokio::test]
async fn test_full_lifecycle_happy_path() {
    let h = TestHarness::new();
    let transfer = h.create_transfer(&[2, 5]);
    let id = transfer.id();

    // Pre-flight validation finds nothing wrong and stashes the records.
    let validation = h.validator.validate(&transfer).await;
    assert!(validation.is_valid(), "errors: {:?}", validation.errors());
    assert!(validation.warehouse(h.source).is_some());
    assert!(validation.inventory(transfer.items()[0].inventory_id).is_some());

    // Approve: stock reserved, status advances.
    let approved = h.coordinator.approve(id).await.unwrap();
    assert_eq!(approved.status(), TransferStatus::Approved);
    assert_eq!(h.inventory.reserve_count(), 2);

    // Pick every item, recording a short count for the first one.
    h.coordinator.start_picking(id).await.unwrap();
    h.coordinator
        .pick_item(id, transfer.items()[0].id, Some(1))
        .await
        .unwrap();
    h.coordinator
        .pick_item(id, transfer.items()[1].id, None)
        .await
        .unwrap();
    let packing = h.coordinator.complete_picking(id).await.unwrap();
    assert_eq!(packing.status(), TransferStatus::Packing);

    // Pack every item.
    for item in transfer.items() {
        h.coordinator.pack_item(id, item.id).await.unwrap();
    }
    let ready = h.coordinator.complete_packing(id).await.unwrap();
    assert_eq!(ready.status(), TransferStatus::ReadyForPickup);

    // Carrier pickup.
    let in_transit = h
        .coordinator
        .pickup(id, "CARRIER-7", "TRK-123456", "https://labels.test/trk-123456.pdf")
        .await
        .unwrap();
    assert_eq!(in_transit.status(), TransferStatus::InTransit);
    assert_eq!(in_transit.tracking_number(), Some("TRK-123456"));
    assert!(in_transit.all_items_have_status(ItemStatus::InTransit));

    // Arrival and verification.
    let arrived = h.coordinator.arrive(id).await.unwrap();
    assert_eq!(arrived.status(), TransferStatus::Arrived);
    assert!(arrived.all_items_have_status(ItemStatus::Arrived));
    let verifying = h.coordinator.verify(id).await.unwrap();
    assert_eq!(verifying.status(), TransferStatus::Verifying);

    // Completion moves the stock, honouring the short pick.
    let completed = h.coordinator.complete(id).await.unwrap();
    assert_eq!(completed.status(), TransferStatus::Completed);
    assert!(completed.all_items_have_status(ItemStatus::Completed));

    let movements = h.inventory.transferred();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].quantity, 1);
    assert_eq!(movements[1].quantity, 5);
    assert_eq!(movements[0].source, h.source);
    assert_eq!(movements[0].destination, h.destination);
}

#[tokio::test]
async fn test_skipping_a_step_is_rejected() {
    let h = TestHarness::new();
    let transfer = h.create_transfer(&[2]);
    let id = transfer.id();

    h.coordinator.approve(id).await.unwrap();

    // Still Approved; the carrier cannot pick the shipment up yet.
    let err = h
        .coordinator
        .pickup(id, "CARRIER-7", "TRK-1", "https://labels.test/1.pdf")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::InvalidState { ref expected, actual: TransferStatus::Approved }
            if expected == "ReadyForPickup"
    ));
    assert_eq!(h.status(id).await, TransferStatus::Approved);

    // Completion is equally out of reach.
    let err = h.coordinator.complete(id).await.unwrap_err();
    assert!(matches!(err, TransferError::InvalidState { .. }));
    assert_eq!(h.inventory.transfer_count(), 0);
}

#[tokio::test]
async fn test_validation_rejects_unknown_source_stock() {
    let h = TestHarness::new();
    // Items created directly, without stock records at the source.
    let items = vec![TransferItem::new(
        InventoryId::new(),
        ProductId::new(),
        "SKU-000",
        4,
    )];
    let transfer = TransferRequest::new(
        TransferId::new(),
        "TRF-2024-0002",
        h.source,
        h.destination,
        items,
    );

    let validation = h.validator.validate(&transfer).await;

    assert!(!validation.is_valid());
    assert!(validation.errors()[0].contains("does not exist"));
}

#[tokio::test]
async fn test_approve_failure_rolls_back_and_leaves_transfer_pending() {
    let h = TestHarness::new();
    let transfer = h.create_transfer(&[2, 5, 7]);
    let id = transfer.id();
    h.inventory
        .fail_reserve_for(transfer.items()[2].inventory_id, 409);

    let err = h.coordinator.approve(id).await.unwrap_err();

    assert!(matches!(err, TransferError::Integration { .. }));
    assert_eq!(
        h.inventory.released(),
        vec![
            (transfer.items()[0].inventory_id, 2),
            (transfer.items()[1].inventory_id, 5),
        ]
    );
    assert_eq!(h.status(id).await, TransferStatus::PendingApproval);

    // The transfer can still be cancelled after the failed approval.
    let cancelled = h.coordinator.cancel(id).await.unwrap();
    assert_eq!(cancelled.status(), TransferStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_ready_for_pickup_releases_reservations() {
    let h = TestHarness::new();
    let transfer = h.create_transfer(&[2, 5]);
    let id = transfer.id();

    h.coordinator.approve(id).await.unwrap();
    h.coordinator.start_picking(id).await.unwrap();
    for item in transfer.items() {
        h.coordinator.pick_item(id, item.id, None).await.unwrap();
    }
    h.coordinator.complete_picking(id).await.unwrap();
    for item in transfer.items() {
        h.coordinator.pack_item(id, item.id).await.unwrap();
    }
    h.coordinator.complete_packing(id).await.unwrap();
    assert_eq!(h.status(id).await, TransferStatus::ReadyForPickup);

    let cancelled = h.coordinator.cancel(id).await.unwrap();

    assert_eq!(cancelled.status(), TransferStatus::Cancelled);
    assert_eq!(
        h.inventory.released(),
        vec![
            (transfer.items()[0].inventory_id, 2),
            (transfer.items()[1].inventory_id, 5),
        ]
    );
}

#[tokio::test]
async fn test_cancel_completed_transfer_is_rejected() {
    let h = TestHarness::new();
    let transfer = h.create_transfer(&[2]);
    let id = transfer.id();

    h.coordinator.approve(id).await.unwrap();
    h.coordinator.start_picking(id).await.unwrap();
    h.coordinator
        .pick_item(id, transfer.items()[0].id, None)
        .await
        .unwrap();
    h.coordinator.complete_picking(id).await.unwrap();
    h.coordinator.pack_item(id, transfer.items()[0].id).await.unwrap();
    h.coordinator.complete_packing(id).await.unwrap();
    h.coordinator
        .pickup(id, "CARRIER-7", "TRK-1", "https://labels.test/1.pdf")
        .await
        .unwrap();
    h.coordinator.arrive(id).await.unwrap();
    h.coordinator.verify(id).await.unwrap();
    h.coordinator.complete(id).await.unwrap();

    let err = h.coordinator.cancel(id).await.unwrap_err();
    assert!(matches!(
        err,
        TransferError::InvalidState { actual: TransferStatus::Completed, .. }
    ));
}

#[tokio::test]
async fn test_completion_failure_leaves_exception_with_partial_stock_moved() {
    let h = TestHarness::new();
    let transfer = h.create_transfer(&[2, 5]);
    let id = transfer.id();

    h.coordinator.approve(id).await.unwrap();
    h.coordinator.start_picking(id).await.unwrap();
    for item in transfer.items() {
        h.coordinator.pick_item(id, item.id, None).await.unwrap();
    }
    h.coordinator.complete_picking(id).await.unwrap();
    for item in transfer.items() {
        h.coordinator.pack_item(id, item.id).await.unwrap();
    }
    h.coordinator.complete_packing(id).await.unwrap();
    h.coordinator
        .pickup(id, "CARRIER-7", "TRK-1", "https://labels.test/1.pdf")
        .await
        .unwrap();
    h.coordinator.arrive(id).await.unwrap();
    h.coordinator.verify(id).await.unwrap();

    h.inventory
        .fail_transfer_for(transfer.items()[1].inventory_id, 409);
    let err = h.coordinator.complete(id).await.unwrap_err();

    assert!(matches!(err, TransferError::Integration { .. }));
    assert_eq!(h.status(id).await, TransferStatus::Exception);
    assert_eq!(h.inventory.transfer_count(), 1);

    // An exception transfer is frozen: no further lifecycle calls apply.
    let err = h.coordinator.cancel(id).await.unwrap_err();
    assert!(matches!(err, TransferError::InvalidState { .. }));
}

#[tokio::test]
async fn test_independent_transfers_do_not_interfere() {
    let h = TestHarness::new();
    let first = h.create_transfer(&[2]);
    let second = h.create_transfer(&[5]);

    h.coordinator.approve(first.id()).await.unwrap();
    h.inventory.fail_reserve_for(second.items()[0].inventory_id, 409);
    let err = h.coordinator.approve(second.id()).await.unwrap_err();
    assert!(matches!(err, TransferError::Integration { .. }));

    assert_eq!(h.status(first.id()).await, TransferStatus::Approved);
    assert_eq!(h.status(second.id()).await, TransferStatus::PendingApproval);
    assert_eq!(h.inventory.reserve_count(), 1);
}
