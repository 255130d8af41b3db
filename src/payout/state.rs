//! Payout and Event Status Definitions
//!
//! A payout's visible state is `(payout.status, last_event.type, last_event.status)`.
//! The two status enums here make up the status half of that triple.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payout lifecycle status
///
/// Monotonic: a payout may only move PROCESSING → COMPLETED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    /// Payout still has events to run
    Processing,

    /// Terminal: the configured event sequence finished successfully
    Completed,
}

impl PayoutStatus {
    /// Check whether moving from `self` to `next` respects monotonicity
    #[inline]
    pub fn can_move_to(&self, next: PayoutStatus) -> bool {
        *self <= next
    }

    /// Get human-readable status name
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Processing => "PROCESSING",
            PayoutStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(PayoutStatus::Processing),
            "COMPLETED" => Ok(PayoutStatus::Completed),
            other => Err(format!("unknown payout status: {}", other)),
        }
    }
}

/// Payout event status
///
/// An event is recorded in PROCESSING as an intent, then revised in place
/// (same event id) to SUCCESS or ERROR once its side effect finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Processing,
    Success,
    Error,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Processing => "PROCESSING",
            EventStatus::Success => "SUCCESS",
            EventStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(EventStatus::Processing),
            "SUCCESS" => Ok(EventStatus::Success),
            "ERROR" => Ok(EventStatus::Error),
            other => Err(format!("unknown event status: {}", other)),
        }
    }
}
