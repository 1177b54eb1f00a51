//! Core domain types for the ticket service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::OrderId;

/// Train identifier, e.g. `G1001`.
pub type TrainId = String;

/// A passenger buying a ticket or waiting for one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: String,
    pub name: String,
}

impl Passenger {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Immutable description of the tracked train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainInfo {
    pub id: TrainId,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
}

/// Point-in-time view of the train inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub total: u32,
    pub sold: u32,
    pub date: NaiveDate,
}

impl Train {
    /// Seats still available for direct purchase.
    pub fn remaining(&self) -> u32 {
        self.total - self.sold
    }
}

/// Lifecycle of a waitlist order. The only transition is `Waiting -> Promoted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStatus {
    /// Order is in the positional queue.
    #[default]
    Waiting,
    /// Order received a refunded seat and left the queue.
    Promoted,
}

/// A waitlist order as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOrder {
    pub order_id: OrderId,
    pub passenger: Passenger,
    pub train_id: TrainId,
    pub date: NaiveDate,
    pub create_time: DateTime<Utc>,
    /// 1-based queue position; `None` once promoted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub status: WaitStatus,
}

impl WaitOrder {
    /// Create a new order in the `Waiting` state.
    pub fn new(
        order_id: OrderId,
        passenger: Passenger,
        train_id: TrainId,
        date: NaiveDate,
        position: usize,
    ) -> Self {
        Self {
            order_id,
            passenger,
            train_id,
            date,
            create_time: Utc::now(),
            position: Some(position),
            status: WaitStatus::Waiting,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.status == WaitStatus::Waiting
    }
}
