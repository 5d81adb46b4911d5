//! Transfer workflow coordinator.

use common::{ItemId, TransferId};
use domain::{ItemStatus, TransferAction, TransferItem, TransferRequest, TransferStatus};

use crate::config::RetryConfig;
use crate::error::TransferError;
use crate::reasons;
use crate::retry::RetryExecutor;
use crate::services::{InventoryService, TransferStore};

/// Orchestrates the cross-warehouse transfer workflow.
///
/// Drives a transfer through approval, picking, packing, pickup, transit,
/// arrival, verification, and completion with a strict per-operation
/// state precondition taken from the [`TransferAction`] transition table.
/// Inventory effects go through the retry executor; failures trigger
/// best-effort compensation (releasing reservations, marking the transfer
/// `Exception`) before the original error is re-raised.
///
/// The coordinator is stateless aside from the retry policy. Transfer
/// state lives behind the [`TransferStore`], which must provide atomic
/// read-modify-write per transfer id; calls for different transfers are
/// independently parallelizable.
pub struct TransferCoordinator<S, I>
where
    S: TransferStore,
    I: InventoryService,
{
    store: S,
    inventory: I,
    retry: RetryExecutor,
}

impl<S, I> TransferCoordinator<S, I>
where
    S: TransferStore,
    I: InventoryService,
{
    /// Creates a new coordinator over the given collaborators.
    pub fn new(store: S, inventory: I, config: RetryConfig) -> Self {
        Self {
            store,
            inventory,
            retry: RetryExecutor::new(config),
        }
    }

    /// Approves a pending transfer, reserving every item's requested
    /// quantity at the source warehouse.
    ///
    /// If any reservation fails, reservations already made for this
    /// transfer are released (best-effort, per item) before the error
    /// propagates.
    #[tracing::instrument(skip(self))]
    pub async fn approve(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError> {
        metrics::counter!("transfer_approvals_total").increment(1);
        let transfer = self.store.get(transfer_id).await?;
        require(&transfer, TransferAction::Approve)?;

        let items = transfer.items();
        for (index, item) in items.iter().enumerate() {
            let reserved = self
                .retry
                .run(
                    &format!(
                        "reserve inventory {} for transfer {transfer_id}",
                        item.inventory_id
                    ),
                    || {
                        self.inventory.reserve(
                            item.inventory_id,
                            item.requested_quantity,
                            reasons::RESERVE_FOR_TRANSFER,
                            transfer_id,
                        )
                    },
                )
                .await;

            if let Err(err) = reserved {
                tracing::warn!(
                    %transfer_id,
                    inventory_id = %item.inventory_id,
                    error = %err,
                    "reservation failed, rolling back earlier reservations"
                );
                self.release_reservations(transfer_id, &items[..index]).await;
                return Err(err);
            }
        }

        match self
            .store
            .set_status(transfer_id, TransferAction::Approve.target())
            .await
        {
            Ok(approved) => {
                tracing::info!(%transfer_id, items = items.len(), "transfer approved");
                Ok(approved)
            }
            Err(err) => {
                self.release_reservations(transfer_id, items).await;
                Err(err)
            }
        }
    }

    /// Moves an approved transfer into picking.
    #[tracing::instrument(skip(self))]
    pub async fn start_picking(
        &self,
        transfer_id: TransferId,
    ) -> Result<TransferRequest, TransferError> {
        let transfer = self.store.get(transfer_id).await?;
        require(&transfer, TransferAction::StartPicking)?;
        self.store
            .set_status(transfer_id, TransferAction::StartPicking.target())
            .await
    }

    /// Records one item as picked, with the counted quantity when it
    /// differs from the requested one.
    #[tracing::instrument(skip(self))]
    pub async fn pick_item(
        &self,
        transfer_id: TransferId,
        item_id: ItemId,
        actual_quantity: Option<u32>,
    ) -> Result<(), TransferError> {
        let transfer = self.store.get(transfer_id).await?;
        require_status(&transfer, TransferStatus::Picking)?;
        require_item(&transfer, item_id, ItemStatus::Pending)?;

        if let Some(quantity) = actual_quantity {
            self.store
                .set_item_actual_quantity(transfer_id, item_id, quantity)
                .await?;
        }
        self.store
            .set_item_status(transfer_id, item_id, ItemStatus::Picked)
            .await
    }

    /// Records one picked item as packed.
    #[tracing::instrument(skip(self))]
    pub async fn pack_item(
        &self,
        transfer_id: TransferId,
        item_id: ItemId,
    ) -> Result<(), TransferError> {
        let transfer = self.store.get(transfer_id).await?;
        require_status(&transfer, TransferStatus::Packing)?;
        require_item(&transfer, item_id, ItemStatus::Picked)?;

        self.store
            .set_item_status(transfer_id, item_id, ItemStatus::Packed)
            .await
    }

    /// Closes the picking phase once every item has been picked.
    #[tracing::instrument(skip(self))]
    pub async fn complete_picking(
        &self,
        transfer_id: TransferId,
    ) -> Result<TransferRequest, TransferError> {
        self.close_phase(transfer_id, TransferAction::CompletePicking, ItemStatus::Picked)
            .await
    }

    /// Closes the packing phase once every item has been packed.
    #[tracing::instrument(skip(self))]
    pub async fn complete_packing(
        &self,
        transfer_id: TransferId,
    ) -> Result<TransferRequest, TransferError> {
        self.close_phase(transfer_id, TransferAction::CompletePacking, ItemStatus::Packed)
            .await
    }

    async fn close_phase(
        &self,
        transfer_id: TransferId,
        action: TransferAction,
        expected: ItemStatus,
    ) -> Result<TransferRequest, TransferError> {
        let transfer = self.store.get(transfer_id).await?;
        require(&transfer, action)?;

        let pending = transfer.items_not_in_status(expected);
        if pending > 0 {
            return Err(TransferError::ItemsNotReady {
                target: action.target(),
                expected,
                pending,
                total: transfer.items().len(),
            });
        }
        self.store.set_status(transfer_id, action.target()).await
    }

    /// Hands the transfer to a carrier: persists the tracking details and
    /// moves the request and every item into transit.
    #[tracing::instrument(skip(self, label_url))]
    pub async fn pickup(
        &self,
        transfer_id: TransferId,
        carrier_id: &str,
        tracking_number: &str,
        label_url: &str,
    ) -> Result<TransferRequest, TransferError> {
        let transfer = self.store.get(transfer_id).await?;
        require(&transfer, TransferAction::Pickup)?;

        match self
            .apply_pickup(&transfer, carrier_id, tracking_number, label_url)
            .await
        {
            Ok(updated) => {
                tracing::info!(%transfer_id, carrier_id, tracking_number, "transfer picked up");
                Ok(updated)
            }
            Err(err) => {
                self.mark_exception(transfer_id).await;
                Err(err)
            }
        }
    }

    async fn apply_pickup(
        &self,
        transfer: &TransferRequest,
        carrier_id: &str,
        tracking_number: &str,
        label_url: &str,
    ) -> Result<TransferRequest, TransferError> {
        let transfer_id = transfer.id();
        self.store
            .set_tracking(transfer_id, carrier_id, tracking_number, label_url)
            .await?;
        for item in transfer.items() {
            self.store
                .set_item_status(transfer_id, item.id, ItemStatus::InTransit)
                .await?;
        }
        self.store
            .set_status(transfer_id, TransferAction::Pickup.target())
            .await
    }

    /// Records arrival at the destination warehouse.
    #[tracing::instrument(skip(self))]
    pub async fn arrive(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError> {
        let transfer = self.store.get(transfer_id).await?;
        require(&transfer, TransferAction::Arrive)?;

        for item in transfer.items() {
            self.store
                .set_item_status(transfer_id, item.id, ItemStatus::Arrived)
                .await?;
        }
        self.store
            .set_status(transfer_id, TransferAction::Arrive.target())
            .await
    }

    /// Starts verification of the arrived goods.
    #[tracing::instrument(skip(self))]
    pub async fn verify(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError> {
        let transfer = self.store.get(transfer_id).await?;
        require(&transfer, TransferAction::Verify)?;
        self.store
            .set_status(transfer_id, TransferAction::Verify.target())
            .await
    }

    /// Completes a verified transfer: moves each item's quantity (the
    /// picked count if recorded, else the requested one) from source to
    /// destination, then marks the request completed.
    ///
    /// A mid-loop failure leaves earlier items `Completed` and moves the
    /// request to `Exception` without rolling the moved stock back; that
    /// partial state is a known gap, reconciled manually from `Exception`.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError> {
        let started = std::time::Instant::now();
        let transfer = self.store.get(transfer_id).await?;
        require(&transfer, TransferAction::Complete)?;

        if let Err(err) = self.transfer_all_items(&transfer).await {
            self.mark_exception(transfer_id).await;
            return Err(err);
        }

        match self
            .store
            .set_status(transfer_id, TransferAction::Complete.target())
            .await
        {
            Ok(completed) => {
                metrics::counter!("transfers_completed_total").increment(1);
                metrics::histogram!("transfer_completion_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(%transfer_id, "transfer completed");
                Ok(completed)
            }
            Err(err) => {
                self.mark_exception(transfer_id).await;
                Err(err)
            }
        }
    }

    async fn transfer_all_items(&self, transfer: &TransferRequest) -> Result<(), TransferError> {
        let transfer_id = transfer.id();
        for item in transfer.items() {
            let quantity = item.quantity_to_transfer();
            self.retry
                .run(
                    &format!(
                        "transfer inventory {} for transfer {transfer_id}",
                        item.inventory_id
                    ),
                    || {
                        self.inventory.transfer(
                            item.inventory_id,
                            transfer.source_warehouse_id(),
                            transfer.destination_warehouse_id(),
                            quantity,
                            reasons::COMPLETE_TRANSFER,
                            transfer_id,
                        )
                    },
                )
                .await?;
            self.store
                .set_item_status(transfer_id, item.id, ItemStatus::Completed)
                .await?;
        }
        Ok(())
    }

    /// Cancels a transfer that has not yet left the source warehouse,
    /// releasing any reservations held since approval.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, transfer_id: TransferId) -> Result<TransferRequest, TransferError> {
        let transfer = self.store.get(transfer_id).await?;
        require(&transfer, TransferAction::Cancel)?;

        if transfer.status().holds_reservations() {
            self.release_reservations(transfer_id, transfer.items()).await;
        }

        match self.store.cancel(transfer_id).await {
            Ok(cancelled) => {
                metrics::counter!("transfers_cancelled_total").increment(1);
                tracing::info!(%transfer_id, "transfer cancelled");
                Ok(cancelled)
            }
            Err(err) => {
                self.mark_exception(transfer_id).await;
                Err(err)
            }
        }
    }

    /// Releases reservations for the given items. Best-effort: individual
    /// release failures are logged, never propagated.
    async fn release_reservations(&self, transfer_id: TransferId, items: &[TransferItem]) {
        for item in items {
            if let Err(err) = self
                .inventory
                .release(
                    item.inventory_id,
                    item.requested_quantity,
                    reasons::RELEASE_RESERVATION,
                    transfer_id,
                )
                .await
            {
                tracing::warn!(
                    %transfer_id,
                    inventory_id = %item.inventory_id,
                    error = %err,
                    "failed to release reservation"
                );
            }
        }
    }

    /// Marks the transfer `Exception`. Best-effort: a failure here is
    /// logged so the original error stays visible to the caller.
    async fn mark_exception(&self, transfer_id: TransferId) {
        metrics::counter!("transfer_exceptions_total").increment(1);
        match self
            .store
            .set_status(transfer_id, TransferStatus::Exception)
            .await
        {
            Ok(_) => tracing::warn!(%transfer_id, "transfer moved to exception"),
            Err(err) => {
                tracing::error!(%transfer_id, error = %err, "failed to mark transfer as exception");
            }
        }
    }
}

fn require(transfer: &TransferRequest, action: TransferAction) -> Result<(), TransferError> {
    match action.required_source() {
        Some(expected) => require_status(transfer, expected),
        None => {
            if transfer.status().can_cancel() {
                Ok(())
            } else {
                Err(TransferError::InvalidState {
                    expected: "a cancellable state (PendingApproval through ReadyForPickup)"
                        .to_string(),
                    actual: transfer.status(),
                })
            }
        }
    }
}

fn require_status(
    transfer: &TransferRequest,
    expected: TransferStatus,
) -> Result<(), TransferError> {
    if transfer.status() == expected {
        Ok(())
    } else {
        Err(TransferError::InvalidState {
            expected: expected.as_str().to_string(),
            actual: transfer.status(),
        })
    }
}

fn require_item(
    transfer: &TransferRequest,
    item_id: ItemId,
    expected: ItemStatus,
) -> Result<(), TransferError> {
    let item = transfer.item(item_id).ok_or(TransferError::ItemNotFound {
        transfer: transfer.id(),
        item: item_id,
    })?;
    if item.status == expected {
        Ok(())
    } else {
        Err(TransferError::InvalidItemState {
            item: item_id,
            expected,
            actual: item.status,
        })
    }
}
