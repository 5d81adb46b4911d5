//! Transfer lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The state of a transfer request in its lifecycle.
///
/// State transitions:
/// ```text
/// PendingApproval ─► Approved ─► Picking ─► Packing ─► ReadyForPickup
///        │              │           │          │              │
///        └──────────────┴───────────┴──────────┴──────────────┴─► Cancelled
///
/// ReadyForPickup ─► InTransit ─► Arrived ─► Verifying ─► Completed
/// ```
///
/// Any effect-causing transition that fails mid-flight may land the
/// transfer in `Exception`, which requires manual resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TransferStatus {
    /// Transfer has been submitted and awaits approval.
    #[default]
    PendingApproval,

    /// Stock has been reserved at the source warehouse.
    Approved,

    /// Items are being picked at the source warehouse.
    Picking,

    /// All items picked; items are being packed.
    Packing,

    /// Packed and waiting for a carrier.
    ReadyForPickup,

    /// Handed to a carrier, en route to the destination.
    InTransit,

    /// Arrived at the destination warehouse.
    Arrived,

    /// Arrived goods are being verified against the request.
    Verifying,

    /// Stock has been moved to the destination (terminal state).
    Completed,

    /// Transfer was cancelled before leaving the source (terminal state).
    Cancelled,

    /// An effectful transition failed partway; requires manual resolution.
    Exception,
}

impl TransferStatus {
    /// Returns true if the transfer can still be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            TransferStatus::PendingApproval
                | TransferStatus::Approved
                | TransferStatus::Picking
                | TransferStatus::Packing
                | TransferStatus::ReadyForPickup
        )
    }

    /// Returns true while reservations made at approval are still held
    /// at the source warehouse.
    pub fn holds_reservations(&self) -> bool {
        matches!(
            self,
            TransferStatus::Approved
                | TransferStatus::Picking
                | TransferStatus::Packing
                | TransferStatus::ReadyForPickup
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Cancelled)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::PendingApproval => "PendingApproval",
            TransferStatus::Approved => "Approved",
            TransferStatus::Picking => "Picking",
            TransferStatus::Packing => "Packing",
            TransferStatus::ReadyForPickup => "ReadyForPickup",
            TransferStatus::InTransit => "InTransit",
            TransferStatus::Arrived => "Arrived",
            TransferStatus::Verifying => "Verifying",
            TransferStatus::Completed => "Completed",
            TransferStatus::Cancelled => "Cancelled",
            TransferStatus::Exception => "Exception",
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lifecycle operation on a transfer request.
///
/// [`required_source`](TransferAction::required_source) and
/// [`target`](TransferAction::target) together hold the entire
/// legal-transition table; callers consult them instead of scattering
/// state checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferAction {
    /// Reserve stock and approve the transfer.
    Approve,

    /// Begin picking items at the source warehouse.
    StartPicking,

    /// Finish picking once every item is picked.
    CompletePicking,

    /// Finish packing once every item is packed.
    CompletePacking,

    /// Hand the transfer to a carrier.
    Pickup,

    /// Record arrival at the destination warehouse.
    Arrive,

    /// Begin verification of the arrived goods.
    Verify,

    /// Move stock to the destination and finish the transfer.
    Complete,

    /// Cancel the transfer and release reservations.
    Cancel,
}

impl TransferAction {
    /// The single state this action may fire from.
    ///
    /// `Cancel` returns `None`: it is allowed from every state where
    /// [`TransferStatus::can_cancel`] holds rather than from one state.
    pub fn required_source(&self) -> Option<TransferStatus> {
        match self {
            TransferAction::Approve => Some(TransferStatus::PendingApproval),
            TransferAction::StartPicking => Some(TransferStatus::Approved),
            TransferAction::CompletePicking => Some(TransferStatus::Picking),
            TransferAction::CompletePacking => Some(TransferStatus::Packing),
            TransferAction::Pickup => Some(TransferStatus::ReadyForPickup),
            TransferAction::Arrive => Some(TransferStatus::InTransit),
            TransferAction::Verify => Some(TransferStatus::Arrived),
            TransferAction::Complete => Some(TransferStatus::Verifying),
            TransferAction::Cancel => None,
        }
    }

    /// The state a successful action moves the transfer to.
    pub fn target(&self) -> TransferStatus {
        match self {
            TransferAction::Approve => TransferStatus::Approved,
            TransferAction::StartPicking => TransferStatus::Picking,
            TransferAction::CompletePicking => TransferStatus::Packing,
            TransferAction::CompletePacking => TransferStatus::ReadyForPickup,
            TransferAction::Pickup => TransferStatus::InTransit,
            TransferAction::Arrive => TransferStatus::Arrived,
            TransferAction::Verify => TransferStatus::Verifying,
            TransferAction::Complete => TransferStatus::Completed,
            TransferAction::Cancel => TransferStatus::Cancelled,
        }
    }

    /// Returns the action name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferAction::Approve => "approve",
            TransferAction::StartPicking => "start_picking",
            TransferAction::CompletePicking => "complete_picking",
            TransferAction::CompletePacking => "complete_packing",
            TransferAction::Pickup => "pickup",
            TransferAction::Arrive => "arrive",
            TransferAction::Verify => "verify",
            TransferAction::Complete => "complete",
            TransferAction::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for TransferAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORWARD_ACTIONS: [TransferAction; 8] = [
        TransferAction::Approve,
        TransferAction::StartPicking,
        TransferAction::CompletePicking,
        TransferAction::CompletePacking,
        TransferAction::Pickup,
        TransferAction::Arrive,
        TransferAction::Verify,
        TransferAction::Complete,
    ];

    #[test]
    fn test_default_status_is_pending_approval() {
        assert_eq!(TransferStatus::default(), TransferStatus::PendingApproval);
    }

    #[test]
    fn test_can_cancel_before_pickup_only() {
        assert!(TransferStatus::PendingApproval.can_cancel());
        assert!(TransferStatus::Approved.can_cancel());
        assert!(TransferStatus::Picking.can_cancel());
        assert!(TransferStatus::Packing.can_cancel());
        assert!(TransferStatus::ReadyForPickup.can_cancel());
        assert!(!TransferStatus::InTransit.can_cancel());
        assert!(!TransferStatus::Arrived.can_cancel());
        assert!(!TransferStatus::Verifying.can_cancel());
        assert!(!TransferStatus::Completed.can_cancel());
        assert!(!TransferStatus::Cancelled.can_cancel());
        assert!(!TransferStatus::Exception.can_cancel());
    }

    #[test]
    fn test_holds_reservations_between_approval_and_pickup() {
        assert!(!TransferStatus::PendingApproval.holds_reservations());
        assert!(TransferStatus::Approved.holds_reservations());
        assert!(TransferStatus::Picking.holds_reservations());
        assert!(TransferStatus::Packing.holds_reservations());
        assert!(TransferStatus::ReadyForPickup.holds_reservations());
        assert!(!TransferStatus::InTransit.holds_reservations());
        assert!(!TransferStatus::Completed.holds_reservations());
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert!(!TransferStatus::PendingApproval.is_terminal());
        assert!(!TransferStatus::InTransit.is_terminal());
        assert!(!TransferStatus::Exception.is_terminal());
    }

    #[test]
    fn test_forward_actions_chain_in_order() {
        // Each forward action fires from the previous action's target.
        let mut state = TransferStatus::PendingApproval;
        for action in FORWARD_ACTIONS {
            assert_eq!(action.required_source(), Some(state));
            state = action.target();
        }
        assert_eq!(state, TransferStatus::Completed);
    }

    #[test]
    fn test_cancel_has_no_single_source_state() {
        assert_eq!(TransferAction::Cancel.required_source(), None);
        assert_eq!(TransferAction::Cancel.target(), TransferStatus::Cancelled);
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferStatus::ReadyForPickup.to_string(), "ReadyForPickup");
        assert_eq!(TransferStatus::Exception.to_string(), "Exception");
        assert_eq!(TransferAction::CompletePicking.to_string(), "complete_picking");
    }

    #[test]
    fn test_serialization() {
        let status = TransferStatus::InTransit;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: TransferStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
