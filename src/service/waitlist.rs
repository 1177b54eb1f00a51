use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;

use crate::OrderId;
use crate::model::{Passenger, TrainId, WaitOrder, WaitStatus};

/// FIFO waitlist plus an order index.
///
/// Orders stay in `orders` for the lifetime of the process; only `waiting`
/// orders are in `queue`. Order ids are issued in increasing order and only
/// the head is ever removed, so `queue` is always sorted.
#[derive(Debug)]
pub struct Waitlist {
    next_id: OrderId,
    queue: VecDeque<OrderId>,
    /// Positions stored here are not authoritative, they are recomputed on read
    orders: HashMap<OrderId, WaitOrder>,
}

impl Waitlist {
    pub fn new() -> Self {
        Self {
            next_id: OrderId::new(1),
            queue: VecDeque::new(),
            orders: HashMap::new(),
        }
    }

    /// Number of orders still waiting.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Append a new waiting order at the tail of the queue.
    pub fn enroll(
        &mut self,
        passenger: Passenger,
        train_id: TrainId,
        date: NaiveDate,
    ) -> WaitOrder {
        let order_id = self.next_id;
        self.next_id = order_id.next();

        self.queue.push_back(order_id);
        let order = WaitOrder::new(order_id, passenger, train_id, date, self.queue.len());
        self.orders.insert(order_id, order.clone());

        order
    }

    /// Look an order up by id, with its current queue position.
    pub fn position_of(&self, order_id: OrderId) -> Option<WaitOrder> {
        let mut order = self.orders.get(&order_id)?.clone();
        order.position = match order.status {
            WaitStatus::Waiting => self.queue_position(order_id),
            WaitStatus::Promoted => None,
        };
        Some(order)
    }

    /// Remove the head of the queue and mark it promoted.
    pub fn promote_head(&mut self) -> Option<WaitOrder> {
        let order_id = self.queue.pop_front()?;
        let order = self.orders.get_mut(&order_id)?;
        order.status = WaitStatus::Promoted;
        order.position = None;
        Some(order.clone())
    }

    fn queue_position(&self, order_id: OrderId) -> Option<usize> {
        self.queue.binary_search(&order_id).ok().map(|idx| idx + 1)
    }
}

impl Default for Waitlist {
    fn default() -> Self {
        Self::new()
    }
}
