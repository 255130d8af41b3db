//! Payout FSM - table-driven payout lifecycle engine
//!
//! A payout (PIX or TED transfer) advances through discrete business events.
//! The transition table decides which event may be recorded next; the engine
//! runs each edge's hooks and persists the result atomically.
//!
//! # Modules
//!
//! - [`payout`] - Entity model, transition table, engine and stores
//! - [`config`] - YAML application config
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod logging;
pub mod payout;

// Convenient re-exports at crate root
pub use payout::{
    EventStatus, EventType, Payout, PayoutError, PayoutEvent, PayoutId, PayoutStatus,
    PayoutStore, PayoutType, TransitionEngine, TransitionTable,
};
