//! Async client for the ticket protocol.

use chrono::NaiveDate;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::OrderId;
use crate::model::{Passenger, TrainId};
use crate::protocol::{CheckWaitRequest, Request, Response, TicketRequest};

/// Errors that can occur while talking to the server
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed by server")]
    Closed,
}

/// One connection to a ticket server. Requests are answered in order.
pub struct TicketClient {
    responses: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TicketClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let (reader, writer) = TcpStream::connect(addr).await?.into_split();
        Ok(Self {
            responses: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Send one request and wait for its response.
    pub async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        let line = request.encode()?;
        self.send_raw(&line).await
    }

    pub async fn query_ticket(&mut self) -> Result<Response, ClientError> {
        self.send(&Request::QueryTicket).await
    }

    pub async fn buy_ticket(
        &mut self,
        passenger: Passenger,
        train_id: TrainId,
        date: NaiveDate,
    ) -> Result<Response, ClientError> {
        self.send(&Request::BuyTicket(TicketRequest {
            passenger,
            train_id,
            date,
        }))
        .await
    }

    pub async fn wait_list(
        &mut self,
        passenger: Passenger,
        train_id: TrainId,
        date: NaiveDate,
    ) -> Result<Response, ClientError> {
        self.send(&Request::WaitList(TicketRequest {
            passenger,
            train_id,
            date,
        }))
        .await
    }

    pub async fn check_wait(&mut self, order_id: OrderId) -> Result<Response, ClientError> {
        self.send(&Request::CheckWait(CheckWaitRequest { order_id }))
            .await
    }

    pub async fn refund(&mut self) -> Result<Response, ClientError> {
        self.send(&Request::Refund).await
    }

    /// Send one already encoded line and wait for its response.
    pub async fn send_raw(&mut self, line: &str) -> Result<Response, ClientError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;

        let line = self.responses.next_line().await?.ok_or(ClientError::Closed)?;
        Ok(Response::decode(&line)?)
    }
}
