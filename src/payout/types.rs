//! Payout Core Types
//!
//! Entity model for the payout lifecycle: identifiers, the payout record, its
//! ordered events, and the business records attached by transition hooks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::PayoutError;
use super::state::{EventStatus, PayoutStatus};

/// Payout ID - ULID-based unique identifier
///
/// ULIDs need no coordination and are collision-free for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayoutId(ulid::Ulid);

impl PayoutId {
    /// Generate a new unique PayoutId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for PayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PayoutId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Payout event ID
///
/// Stays the same when an event's status is revised in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(ulid::Ulid);

impl EventId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payout rail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutType {
    Ted,
    Pix,
}

impl PayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutType::Ted => "TED",
            PayoutType::Pix => "PIX",
        }
    }
}

impl fmt::Display for PayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PayoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TED" => Ok(PayoutType::Ted),
            "PIX" => Ok(PayoutType::Pix),
            other => Err(format!("unknown payout type: {}", other)),
        }
    }
}

/// Business step a payout event stands for
///
/// New steps are added here and wired up in the transition table; the engine
/// does not match on event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Resolve who receives the funds
    Counterparty,
    /// Execute the withdrawal
    Withdraw,
    /// Currency exchange
    Exchange,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Counterparty => "COUNTERPARTY",
            EventType::Withdraw => "WITHDRAW",
            EventType::Exchange => "EXCHANGE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discrete step in a payout's lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutEvent {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub status: EventStatus,
}

impl PayoutEvent {
    /// Create a new event with a fresh id
    pub fn new(event_type: EventType, status: EventStatus) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            status,
        }
    }

    /// Same event id and status (an exact re-delivery)
    #[inline]
    pub fn same_revision(&self, other: &PayoutEvent) -> bool {
        self.id == other.id && self.status == other.status
    }
}

impl fmt::Display for PayoutEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.event_type, self.status)
    }
}

/// Resolved receiver of a payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub name: String,
    pub age: u32,
}

/// Executed withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Outbound money-transfer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub payout_type: PayoutType,
    pub status: PayoutStatus,
    pub events: Vec<PayoutEvent>,
    #[serde(default)]
    pub counterparty: Option<Counterparty>,
    #[serde(default)]
    pub withdraw: Option<Withdraw>,
}

impl Payout {
    /// Create a payout in PROCESSING with its first event recorded as an intent
    pub fn new(
        payout_type: PayoutType,
        amount: Decimal,
        first_event: EventType,
    ) -> Result<Self, PayoutError> {
        if amount <= Decimal::ZERO {
            return Err(PayoutError::InvalidAmount);
        }

        Ok(Self {
            id: PayoutId::new(),
            amount,
            payout_type,
            status: PayoutStatus::Processing,
            events: vec![PayoutEvent::new(first_event, EventStatus::Processing)],
            counterparty: None,
            withdraw: None,
        })
    }

    /// Last recorded event; its (type, status) decides what may happen next
    #[inline]
    pub fn last_event(&self) -> Option<&PayoutEvent> {
        self.events.last()
    }

    /// Append a new event and return its id
    pub fn push_event(&mut self, event_type: EventType, status: EventStatus) -> EventId {
        let event = PayoutEvent::new(event_type, status);
        let id = event.id;
        self.events.push(event);
        id
    }

    /// Revise the last event's status in place, keeping its id
    pub fn revise_last_event(&mut self, status: EventStatus) -> Result<EventId, PayoutError> {
        match self.events.last_mut() {
            Some(event) => {
                event.status = status;
                Ok(event.id)
            }
            None => Err(PayoutError::InvalidTransition(format!(
                "payout {} has no event to revise",
                self.id
            ))),
        }
    }

    /// Replace the last event if it carries the same id, otherwise append
    pub fn splice_event(&mut self, event: PayoutEvent) {
        match self.events.last_mut() {
            Some(last) if last.id == event.id => *last = event,
            _ => self.events.push(event),
        }
    }

    /// Mark the payout COMPLETED
    pub fn complete(&mut self) {
        self.status = PayoutStatus::Completed;
    }
}
