//! Command line and environment configuration.

use std::net::SocketAddr;

use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::model::{TrainId, TrainInfo};

/// Train ticket server with an overflow waitlist.
#[derive(Debug, Clone, Parser)]
#[command(name = "train-ticket", version, about)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "TRAIN_TICKET_LISTEN", default_value = "0.0.0.0:8081")]
    pub listen: SocketAddr,

    /// Identifier of the tracked train
    #[arg(long, env = "TRAIN_TICKET_TRAIN_ID", default_value = "G1001")]
    pub train_id: TrainId,

    /// Departure station
    #[arg(long, env = "TRAIN_TICKET_FROM", default_value = "Wuhan")]
    pub from: String,

    /// Arrival station
    #[arg(long, env = "TRAIN_TICKET_TO", default_value = "Beijing")]
    pub to: String,

    /// Travel date (YYYY-MM-DD), today if not set
    #[arg(long, env = "TRAIN_TICKET_DATE")]
    pub date: Option<NaiveDate>,

    /// Number of seats
    #[arg(long, env = "TRAIN_TICKET_CAPACITY", default_value_t = 100)]
    pub capacity: u32,
}

impl Config {
    pub fn train_info(&self) -> TrainInfo {
        TrainInfo {
            id: self.train_id.clone(),
            origin: self.from.clone(),
            destination: self.to.clone(),
            date: self.date.unwrap_or_else(|| Local::now().date_naive()),
        }
    }
}
