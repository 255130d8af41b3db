//! Payout Transition FSM
//!
//! Models a PIX/TED payout as a sequence of business events, each PROCESSING
//! then SUCCESS or ERROR, and decides which event may be recorded next.
//!
//! # Architecture
//!
//! - **Entity model** (`types`, `state`) - payout, events, statuses
//! - **Transition table** (`table`, `rules`) - immutable map from the current
//!   state plus candidate event to the hook bundle governing that edge
//! - **Transition engine** (`engine`) - `warmup` (advisory pre-check) and
//!   `commit` (apply new events and save atomically)
//! - **Persistence contract** (`store`, `db`) - `get` by id and whole-record `save`
//!
//! # Safety Invariants
//!
//! 1. **Re-read before write**: every operation fetches the authoritative record
//! 2. **One committer per payout**: warm-up and commit hold a per-id lock with a
//!    bounded wait
//! 3. **No partial commits**: hooks run on a working copy that is saved once
//! 4. **Monotonic status**: a payout never leaves COMPLETED

pub mod db;
pub mod engine;
pub mod error;
pub mod lock;
pub mod rules;
pub mod state;
pub mod store;
pub mod table;
pub mod types;


// Re-exports for convenience
pub use db::PgPayoutStore;
pub use engine::{TransitionEngine, new_events};
pub use error::PayoutError;
pub use lock::{PayoutLockGuard, PayoutLocks};
pub use state::{EventStatus, PayoutStatus};
pub use store::{JsonFilePayoutStore, MemoryPayoutStore, PayoutStore};
pub use table::{HookKind, TransitionKey, TransitionRule, TransitionTable};
pub use types::{
    Counterparty, EventId, EventType, Payout, PayoutEvent, PayoutId, PayoutType, Withdraw,
};
