use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Waitlist order identifier, rendered on the wire as `ORDER_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct OrderId(u64);

/// Error returned when a string is not a valid `ORDER_<n>` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order id '{0}'")]
pub struct OrderIdError(String);

impl OrderId {
    const PREFIX: &'static str = "ORDER_";

    pub fn new(seq: u64) -> Self {
        OrderId(seq)
    }

    pub fn seq(self) -> u64 {
        self.0
    }

    /// The identifier issued right after this one.
    pub fn next(self) -> Self {
        OrderId(self.0 + 1)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for OrderId {
    type Err = OrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(Self::PREFIX)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .map(OrderId)
            .ok_or_else(|| OrderIdError(s.to_string()))
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for OrderId {
    type Error = OrderIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
