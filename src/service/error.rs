//! Error types for ticket operations.

use thiserror::Error;

use crate::OrderId;
use crate::model::TrainId;

/// Error returned by [`TicketService`](super::TicketService) operations.
///
/// Every variant is an expected business outcome; none of them leave the
/// inventory or the waitlist modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("tickets for train {0} are sold out, you can join the waitlist")]
    SoldOut(TrainId),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("refund failed: {0}")]
    Refund(#[from] LedgerError),
}

/// Error from the seat ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("no sold ticket to release")]
    NothingSold,
}
