pub mod client;
pub mod config;
pub mod model;
pub mod order_id;
pub mod protocol;
pub mod server;
pub mod service;

pub use model::{Passenger, Train, TrainId, TrainInfo, WaitOrder, WaitStatus};
pub use order_id::OrderId;
pub use service::TicketService;
