//! Reason strings recorded against inventory movements.

/// Reason recorded when stock is reserved at approval.
pub const RESERVE_FOR_TRANSFER: &str = "transfer_reservation";

/// Reason recorded when a reservation is released during rollback or
/// cancellation.
pub const RELEASE_RESERVATION: &str = "transfer_reservation_release";

/// Reason recorded when stock moves between warehouses at completion.
pub const COMPLETE_TRANSFER: &str = "transfer_completion";
