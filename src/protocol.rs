//! Line-delimited JSON wire protocol.
//!
//! Every message is one JSON object on its own line:
//! `{"type": "...", "data": ..., "success": bool, "message": "..."}`.
//! Requests are decoded into [`Request`] at the boundary so the service only
//! ever sees typed arguments.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::OrderId;
use crate::model::{Passenger, Train, TrainId, WaitOrder};

/// Errors that can occur when decoding a request line
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(serde_json::Error),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: MessageType,
        source: serde_json::Error,
    },
}

/// Value of the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    QueryTicket,
    BuyTicket,
    WaitList,
    CheckWait,
    Refund,
    Response,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::QueryTicket => "query_ticket",
            MessageType::BuyTicket => "buy_ticket",
            MessageType::WaitList => "wait_list",
            MessageType::CheckWait => "check_wait",
            MessageType::Refund => "refund",
            MessageType::Response => "response",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query_ticket" => Ok(MessageType::QueryTicket),
            "buy_ticket" => Ok(MessageType::BuyTicket),
            "wait_list" => Ok(MessageType::WaitList),
            "check_wait" => Ok(MessageType::CheckWait),
            "refund" => Ok(MessageType::Refund),
            "response" => Ok(MessageType::Response),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

/// Payload of `buy_ticket` and `wait_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub passenger: Passenger,
    pub train_id: TrainId,
    pub date: NaiveDate,
}

/// Payload of `check_wait`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckWaitRequest {
    pub order_id: OrderId,
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    QueryTicket,
    BuyTicket(TicketRequest),
    WaitList(TicketRequest),
    CheckWait(CheckWaitRequest),
    Refund,
}

/// Raw message as read off the wire; any other field is ignored.
#[derive(Debug, Deserialize)]
struct Envelope {
    r#type: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Serialize)]
struct OutgoingRequest<'a, T: Serialize> {
    r#type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
}

impl Request {
    pub fn kind(&self) -> MessageType {
        match self {
            Request::QueryTicket => MessageType::QueryTicket,
            Request::BuyTicket(_) => MessageType::BuyTicket,
            Request::WaitList(_) => MessageType::WaitList,
            Request::CheckWait(_) => MessageType::CheckWait,
            Request::Refund => MessageType::Refund,
        }
    }

    /// Decode one request line.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(line).map_err(ProtocolError::Malformed)?;
        let kind: MessageType = envelope.r#type.parse()?;

        match kind {
            MessageType::QueryTicket => Ok(Request::QueryTicket),
            MessageType::BuyTicket => Ok(Request::BuyTicket(payload(kind, envelope.data)?)),
            MessageType::WaitList => Ok(Request::WaitList(payload(kind, envelope.data)?)),
            MessageType::CheckWait => Ok(Request::CheckWait(payload(kind, envelope.data)?)),
            MessageType::Refund => Ok(Request::Refund),
            // servers only send responses, they never accept one
            MessageType::Response => Err(ProtocolError::UnknownType(envelope.r#type)),
        }
    }

    /// Encode as one line, without the trailing newline.
    pub fn encode(&self) -> serde_json::Result<String> {
        let kind = self.kind().as_str();
        match self {
            Request::QueryTicket | Request::Refund => {
                serde_json::to_string(&OutgoingRequest::<()> {
                    r#type: kind,
                    data: None,
                })
            }
            Request::BuyTicket(req) | Request::WaitList(req) => {
                serde_json::to_string(&OutgoingRequest {
                    r#type: kind,
                    data: Some(req),
                })
            }
            Request::CheckWait(req) => serde_json::to_string(&OutgoingRequest {
                r#type: kind,
                data: Some(req),
            }),
        }
    }
}

fn payload<T: DeserializeOwned>(kind: MessageType, data: Option<Value>) -> Result<T, ProtocolError> {
    serde_json::from_value(data.unwrap_or(Value::Null))
        .map_err(|source| ProtocolError::InvalidPayload { kind, source })
}

/// Data attached to a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Train(Train),
    Order(WaitOrder),
}

/// A server response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    pub success: bool,
    pub message: String,
}

impl Response {
    pub fn ok(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            r#type: MessageType::Response.as_str().to_string(),
            data,
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            r#type: MessageType::Response.as_str().to_string(),
            data: None,
            success: false,
            message: message.to_string(),
        }
    }

    /// The train snapshot carried by a `query_ticket` response.
    pub fn train(&self) -> Option<&Train> {
        match &self.data {
            Some(ResponseData::Train(train)) => Some(train),
            _ => None,
        }
    }

    /// The order carried by a `wait_list` or `check_wait` response.
    pub fn order(&self) -> Option<&WaitOrder> {
        match &self.data {
            Some(ResponseData::Order(order)) => Some(order),
            _ => None,
        }
    }

    /// Encode as one line, without the trailing newline.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
