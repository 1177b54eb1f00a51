//! Ticket service.
//!
//! The service owns the seat ledger and the waitlist of the tracked train and
//! exposes the five ticket operations. All state sits behind one `RwLock`:
//! queries take the shared lock, mutations take the exclusive lock for their
//! whole multi-step logic, so no caller ever observes a refunded seat that has
//! not yet been handed to the waitlist head.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use tracing::info;

use crate::OrderId;
use crate::model::{Passenger, Train, TrainId, TrainInfo, WaitOrder};

mod ledger;
pub use ledger::Ledger;

mod waitlist;
pub use waitlist::Waitlist;

mod error;
pub use error::{LedgerError, ServiceError};

/// State guarded by the service lock.
#[derive(Debug)]
struct Inventory {
    ledger: Ledger,
    waitlist: Waitlist,
}

/// The ticket service for a single train.
#[derive(Debug)]
pub struct TicketService {
    train: TrainInfo,
    inventory: RwLock<Inventory>,
}

/// Public API
impl TicketService {
    pub fn new(train: TrainInfo, capacity: u32) -> Self {
        Self {
            train,
            inventory: RwLock::new(Inventory {
                ledger: Ledger::new(capacity),
                waitlist: Waitlist::new(),
            }),
        }
    }

    /// The tracked train.
    pub fn train(&self) -> &TrainInfo {
        &self.train
    }

    /// Snapshot of the train inventory.
    pub fn query_ticket(&self) -> Train {
        let (total, sold) = self.read().ledger.availability();
        Train {
            id: self.train.id.clone(),
            origin: self.train.origin.clone(),
            destination: self.train.destination.clone(),
            total,
            sold,
            date: self.train.date,
        }
    }

    /// Buy one ticket. Does not enroll on the waitlist when sold out.
    pub fn buy_ticket(&self, passenger: &Passenger) -> Result<(), ServiceError> {
        let (allocated, sold) = {
            let mut inventory = self.write();
            let allocated = inventory.ledger.try_allocate();
            (allocated, inventory.ledger.availability().1)
        };

        let result = if allocated {
            Ok(())
        } else {
            Err(ServiceError::SoldOut(self.train.id.clone()))
        };
        Self::log_result("buy", &passenger.id, sold, &result);
        result
    }

    /// Enroll on the waitlist. The waitlist has no capacity limit.
    pub fn add_to_wait_list(
        &self,
        passenger: Passenger,
        train_id: TrainId,
        date: NaiveDate,
    ) -> WaitOrder {
        let order = self.write().waitlist.enroll(passenger, train_id, date);

        info!(
            order_id = %order.order_id,
            passenger = %order.passenger.id,
            position = ?order.position,
            "wait list applied"
        );
        order
    }

    /// Look up a waitlist order with its current position.
    pub fn check_wait_position(&self, order_id: OrderId) -> Result<WaitOrder, ServiceError> {
        self.read()
            .waitlist
            .position_of(order_id)
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    /// Refund one sold ticket.
    ///
    /// The released seat goes straight to the waitlist head if there is one,
    /// in which case the promoted order is returned and `sold` is unchanged.
    /// Fails without touching any state when nothing is sold.
    pub fn process_refund(&self) -> Result<Option<WaitOrder>, ServiceError> {
        let (result, sold) = {
            let mut inventory = self.write();
            let result = Self::refund(&mut inventory);
            (result, inventory.ledger.availability().1)
        };

        match &result {
            Ok(Some(order)) => info!(
                order_id = %order.order_id,
                passenger = %order.passenger.id,
                sold,
                "refund applied, waitlist head promoted"
            ),
            _ => Self::log_result("refund", "-", sold, &result),
        }
        result
    }

    /// Number of orders still waiting.
    pub fn waitlist_len(&self) -> usize {
        self.read().waitlist.len()
    }
}

/// Private API
impl TicketService {
    fn read(&self) -> RwLockReadGuard<'_, Inventory> {
        // Critical sections never panic halfway, so a poisoned lock still guards a consistent state
        self.inventory.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inventory> {
        self.inventory.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release one seat, then hand it to the waitlist head if any.
    /// Must run under the write lock.
    fn refund(inventory: &mut Inventory) -> Result<Option<WaitOrder>, ServiceError> {
        inventory.ledger.release()?;

        let Some(order) = inventory.waitlist.promote_head() else {
            return Ok(None);
        };

        // The seat released above is still free: nobody else holds the lock
        let reallocated = inventory.ledger.try_allocate();
        debug_assert!(reallocated, "released seat must be reallocatable");

        Ok(Some(order))
    }

    /// Small helper to log operation results
    fn log_result<T, E: fmt::Display>(op: &str, passenger: &str, sold: u32, result: &Result<T, E>) {
        match result {
            Ok(_) => info!(passenger, sold, "{op} applied"),
            Err(e) => info!(passenger, sold, reason = %e, "{op} rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::WaitStatus;

    // test utils

    fn service(capacity: u32) -> TicketService {
        TicketService::new(
            TrainInfo {
                id: "G1001".to_string(),
                origin: "Wuhan".to_string(),
                destination: "Beijing".to_string(),
                date: date(),
            },
            capacity,
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn passenger(n: u32) -> Passenger {
        Passenger::new(format!("ID_{n}"), format!("passenger {n}"))
    }

    fn wait(service: &TicketService, n: u32) -> WaitOrder {
        service.add_to_wait_list(passenger(n), "G1001".to_string(), date())
    }

    fn sold(service: &TicketService) -> u32 {
        service.query_ticket().sold
    }

    #[test]
    fn new_service() {
        let service = service(100);
        let train = service.query_ticket();

        assert_eq!(train.id, "G1001");
        assert_eq!(train.origin, "Wuhan");
        assert_eq!(train.destination, "Beijing");
        assert_eq!(train.date, date());
        assert_eq!(train.total, 100);
        assert_eq!(train.sold, 0);
        assert_eq!(service.waitlist_len(), 0);
    }

    // Buy

    #[test]
    fn buy_increments_sold() {
        let service = service(2);
        service.buy_ticket(&passenger(1)).unwrap();

        assert_eq!(sold(&service), 1);
    }

    #[test]
    fn buy_sold_out_fails_without_enrolling() {
        let service = service(1);
        service.buy_ticket(&passenger(1)).unwrap();

        let result = service.buy_ticket(&passenger(2));
        assert_eq!(result, Err(ServiceError::SoldOut("G1001".to_string())));
        assert!(result.unwrap_err().to_string().contains("waitlist"));

        assert_eq!(sold(&service), 1);
        assert_eq!(service.waitlist_len(), 0);
    }

    // Wait list

    #[test]
    fn enrollments_get_increasing_ids_and_positions() {
        let service = service(0);
        let orders: Vec<_> = (1..=3).map(|n| wait(&service, n)).collect();

        assert!(orders[0].order_id < orders[1].order_id);
        assert!(orders[1].order_id < orders[2].order_id);
        let positions: Vec<_> = orders.iter().map(|o| o.position).collect();
        assert_eq!(positions, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn wait_list_is_accepted_while_tickets_remain() {
        let service = service(10);
        let order = wait(&service, 1);

        assert_eq!(order.status, WaitStatus::Waiting);
        assert_eq!(order.position, Some(1));
        assert_eq!(sold(&service), 0);
    }

    // Check wait position

    #[test]
    fn check_unknown_order_fails() {
        let service = service(1);
        let missing = "ORDER_999".parse().unwrap();

        let result = service.check_wait_position(missing);
        assert_eq!(result, Err(ServiceError::OrderNotFound(missing)));
        assert_eq!(result.unwrap_err().to_string(), "order ORDER_999 not found");
    }

    #[test]
    fn check_reports_current_position() {
        let service = service(1);
        service.buy_ticket(&passenger(1)).unwrap();
        let first = wait(&service, 2);
        let second = wait(&service, 3);

        service.process_refund().unwrap();

        let first = service.check_wait_position(first.order_id).unwrap();
        assert_eq!(first.status, WaitStatus::Promoted);
        assert_eq!(first.position, None);

        let second = service.check_wait_position(second.order_id).unwrap();
        assert_eq!(second.status, WaitStatus::Waiting);
        assert_eq!(second.position, Some(1));
    }

    // Refund

    #[test]
    fn refund_with_nothing_sold_changes_nothing() {
        let service = service(1);
        let order = wait(&service, 1);

        let result = service.process_refund();
        assert_eq!(result, Err(ServiceError::Refund(LedgerError::NothingSold)));

        assert_eq!(sold(&service), 0);
        assert_eq!(service.waitlist_len(), 1);
        let order = service.check_wait_position(order.order_id).unwrap();
        assert_eq!(order.status, WaitStatus::Waiting);
    }

    #[test]
    fn refund_with_empty_waitlist_decrements_sold() {
        let service = service(3);
        service.buy_ticket(&passenger(1)).unwrap();
        service.buy_ticket(&passenger(2)).unwrap();

        assert_eq!(service.process_refund(), Ok(None));
        assert_eq!(sold(&service), 1);
    }

    #[test]
    fn refund_with_waitlist_keeps_sold_and_shrinks_queue() {
        let service = service(2);
        service.buy_ticket(&passenger(1)).unwrap();
        service.buy_ticket(&passenger(2)).unwrap();
        wait(&service, 3);
        wait(&service, 4);

        let promoted = service.process_refund().unwrap().unwrap();
        assert_eq!(promoted.passenger, passenger(3));
        assert_eq!(promoted.status, WaitStatus::Promoted);

        assert_eq!(sold(&service), 2);
        assert_eq!(service.waitlist_len(), 1);
    }

    #[test]
    fn refunds_promote_in_fifo_order() {
        let service = service(3);
        for n in 1..=3 {
            service.buy_ticket(&passenger(n)).unwrap();
        }
        let orders: Vec<_> = (4..=6).map(|n| wait(&service, n)).collect();

        let promoted: Vec<_> = (0..3)
            .map(|_| service.process_refund().unwrap().unwrap().order_id)
            .collect();

        let enrolled: Vec<_> = orders.iter().map(|o| o.order_id).collect();
        assert_eq!(promoted, enrolled);
        assert_eq!(sold(&service), 3);

        // queue drained, next refund frees a seat
        assert_eq!(service.process_refund(), Ok(None));
        assert_eq!(sold(&service), 2);
    }

    #[test]
    fn sold_out_waitlist_refund_scenario() {
        let service = service(1);

        service.buy_ticket(&passenger(1)).unwrap();
        assert_eq!(sold(&service), 1);

        assert!(matches!(
            service.buy_ticket(&passenger(2)),
            Err(ServiceError::SoldOut(_))
        ));

        let order = wait(&service, 2);
        assert_eq!(order.position, Some(1));

        let promoted = service.process_refund().unwrap().unwrap();
        assert_eq!(promoted.order_id, order.order_id);

        let order = service.check_wait_position(order.order_id).unwrap();
        assert_eq!(order.status, WaitStatus::Promoted);
        assert_eq!(sold(&service), 1);
    }

    // Concurrency

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_buys_never_oversell() {
        const CAPACITY: u32 = 25;
        const BUYERS: u32 = 200;

        let service = Arc::new(service(CAPACITY));
        let handles: Vec<_> = (0..BUYERS)
            .map(|n| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.buy_ticket(&passenger(n)).is_ok() })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, CAPACITY);
        assert_eq!(sold(&service), CAPACITY);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refunds_promote_each_order_once() {
        const CAPACITY: u32 = 10;

        let service = Arc::new(service(CAPACITY));
        for n in 0..CAPACITY {
            service.buy_ticket(&passenger(n)).unwrap();
        }
        for n in 0..CAPACITY {
            wait(&service, 100 + n);
        }

        let handles: Vec<_> = (0..CAPACITY)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.process_refund() })
            })
            .collect();

        let mut promoted = Vec::new();
        for handle in handles {
            promoted.push(handle.await.unwrap().unwrap().unwrap().order_id);
        }
        promoted.sort();
        promoted.dedup();

        assert_eq!(promoted.len(), CAPACITY as usize);
        assert_eq!(sold(&service), CAPACITY);
        assert_eq!(service.waitlist_len(), 0);
    }
}
