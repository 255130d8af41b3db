//! Payout Error Types
//!
//! Structural failures (unknown transition, lock contention, storage) are kept
//! apart from business failures raised by transition hooks, so callers can
//! tell them apart without string matching.

use thiserror::Error;

use super::table::HookKind;
use super::types::PayoutId;

/// Payout engine error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayoutError {
    // === Lookup Errors ===
    #[error("Payout not found: {0}")]
    NotFound(PayoutId),

    #[error("Payout already exists: {0}")]
    AlreadyExists(PayoutId),

    // === Transition Errors ===
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Incoming payout is stale: {incoming} events vs {persisted} persisted")]
    StaleIncoming { persisted: usize, incoming: usize },

    #[error("Duplicate transition registered: {0}")]
    DuplicateTransition(String),

    // === Business Errors ===
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("{hook} hook failed: {reason}")]
    HookFailed { hook: HookKind, reason: String },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    // === System Errors ===
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Timed out after {waited_ms}ms waiting for payout lock: {payout_id}")]
    LockTimeout { payout_id: PayoutId, waited_ms: u64 },
}

impl PayoutError {
    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PayoutError::NotFound(_) => "NOT_FOUND",
            PayoutError::AlreadyExists(_) => "ALREADY_EXISTS",
            PayoutError::InvalidTransition(_) => "INVALID_TRANSITION",
            PayoutError::StaleIncoming { .. } => "STALE_INCOMING",
            PayoutError::DuplicateTransition(_) => "DUPLICATE_TRANSITION",
            PayoutError::ValidationFailed(_) => "VALIDATION_FAILED",
            PayoutError::HookFailed { .. } => "HOOK_FAILED",
            PayoutError::InvalidAmount => "INVALID_AMOUNT",
            PayoutError::Persistence(_) => "PERSISTENCE_ERROR",
            PayoutError::LockTimeout { .. } => "LOCK_TIMEOUT",
        }
    }

    /// Whether the caller may retry the same call unchanged.
    ///
    /// The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PayoutError::LockTimeout { .. })
    }

    /// Check if this error came from a rule hook rather than the engine
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            PayoutError::ValidationFailed(_) | PayoutError::HookFailed { .. }
        )
    }
}

impl From<sqlx::Error> for PayoutError {
    fn from(e: sqlx::Error) -> Self {
        PayoutError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for PayoutError {
    fn from(e: serde_json::Error) -> Self {
        PayoutError::Persistence(format!("serialization: {}", e))
    }
}

impl From<std::io::Error> for PayoutError {
    fn from(e: std::io::Error) -> Self {
        PayoutError::Persistence(format!("io: {}", e))
    }
}
