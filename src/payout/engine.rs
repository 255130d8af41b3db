//! Transition Engine
//!
//! Drives payouts through the [`TransitionTable`]. Both public operations
//! re-read the authoritative record under a per-payout lock instead of trusting
//! the caller's copy.
//!
//! # Commit
//!
//! ```text
//! lock(id) → get(id) → diff events → for each new event:
//!     resolve rule → update → validate → clean-up → splice
//! → save (once) → unlock
//! ```
//!
//! Hooks run against a working copy of the authoritative payout. Nothing is
//! saved unless every new event applied, so a failed commit leaves the stored
//! record untouched.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::PayoutError;
use super::lock::PayoutLocks;
use super::state::{EventStatus, PayoutStatus};
use super::store::PayoutStore;
use super::table::{TransitionKey, TransitionRule, TransitionTable};
use super::types::{EventType, Payout, PayoutEvent, PayoutId};
use crate::config::EngineConfig;

/// Events present in `incoming` that the authoritative sequence has not recorded
///
/// - empty authoritative sequence: every incoming event is new
/// - equal lengths: only the incoming last event (an in-place status revision)
/// - longer incoming: the appended tail, in order
///
/// An event identical to the authoritative last event (same id and status) is an
/// exact re-delivery and is dropped. A shorter incoming sequence means the caller
/// worked from an outdated copy and fails with `StaleIncoming`.
pub fn new_events<'a>(
    persisted: &[PayoutEvent],
    incoming: &'a [PayoutEvent],
) -> Result<Vec<&'a PayoutEvent>, PayoutError> {
    let candidates = if persisted.is_empty() {
        incoming
    } else if incoming.len() == persisted.len() {
        &incoming[incoming.len() - 1..]
    } else if incoming.len() > persisted.len() {
        &incoming[persisted.len()..]
    } else {
        return Err(PayoutError::StaleIncoming {
            persisted: persisted.len(),
            incoming: incoming.len(),
        });
    };

    let last = persisted.last();
    Ok(candidates
        .iter()
        .filter(|event| !last.is_some_and(|l| l.same_revision(event)))
        .collect())
}

/// Shape a payout must have before its first save
fn check_new(payout: &Payout) -> Result<(), PayoutError> {
    if payout.amount <= Decimal::ZERO {
        return Err(PayoutError::InvalidAmount);
    }
    if payout.status != PayoutStatus::Processing {
        return Err(PayoutError::InvalidTransition(format!(
            "payout {} created in {}",
            payout.id, payout.status
        )));
    }
    match payout.events.as_slice() {
        [first] if first.status == EventStatus::Processing => Ok(()),
        [first] => Err(PayoutError::InvalidTransition(format!(
            "payout {} created with first event {}",
            payout.id, first
        ))),
        events => Err(PayoutError::InvalidTransition(format!(
            "payout {} created with {} events",
            payout.id,
            events.len()
        ))),
    }
}

/// Table-driven payout transition engine
pub struct TransitionEngine {
    store: Arc<dyn PayoutStore>,
    table: Arc<TransitionTable>,
    locks: PayoutLocks,
}

impl TransitionEngine {
    pub fn new(
        store: Arc<dyn PayoutStore>,
        table: Arc<TransitionTable>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            store,
            table,
            locks: PayoutLocks::new(lock_timeout),
        }
    }

    /// Engine over the standard table with the configured lock timeout
    pub fn from_config(store: Arc<dyn PayoutStore>, config: &EngineConfig) -> Self {
        Self::new(store, TransitionTable::standard(), config.lock_timeout())
    }

    pub fn locks(&self) -> &PayoutLocks {
        &self.locks
    }

    /// Persist a freshly created payout
    ///
    /// The payout must look like [`Payout::new`] left it: positive amount,
    /// PROCESSING, and exactly one event recorded as a PROCESSING intent.
    pub async fn create(&self, payout: &Payout) -> Result<(), PayoutError> {
        check_new(payout).inspect_err(|e| {
            warn!(payout_id = %payout.id, error = %e, "Create rejected");
        })?;

        let _guard = self.locks.acquire(payout.id).await?;

        match self.store.get(payout.id).await {
            Ok(_) => return Err(PayoutError::AlreadyExists(payout.id)),
            Err(PayoutError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        self.store.save(payout).await?;
        info!(
            payout_id = %payout.id,
            payout_type = %payout.payout_type,
            amount = %payout.amount,
            store = self.store.name(),
            "Payout created"
        );
        Ok(())
    }

    /// Read the authoritative payout
    pub async fn get(&self, id: PayoutId) -> Result<Payout, PayoutError> {
        self.store.get(id).await
    }

    /// Check that `event_type` may be recorded next with each of `statuses`, and
    /// run the matching warm-up hooks
    ///
    /// Every status is resolved before any hook runs, so an unknown status aborts
    /// the call without a partial warm-up. Persisted state is never modified.
    pub async fn warmup(
        &self,
        id: PayoutId,
        event_type: EventType,
        statuses: &[EventStatus],
    ) -> Result<(), PayoutError> {
        let _guard = self.locks.acquire(id).await?;
        let payout = self.store.get(id).await?;

        let key = TransitionKey::for_payout(&payout, event_type)?;
        let rules = self.table.lookup(&key).inspect_err(|e| {
            warn!(payout_id = %id, error = %e, "Warmup rejected");
        })?;
        debug!(
            payout_id = %id,
            key = %key,
            possible = ?rules.keys().collect::<Vec<_>>(),
            "Possible next statuses"
        );

        let resolved = statuses
            .iter()
            .map(|status| {
                rules.get(status).ok_or_else(|| {
                    PayoutError::InvalidTransition(format!("no rule for {}:{}", key, status))
                })
            })
            .collect::<Result<Vec<&TransitionRule>, _>>()
            .inspect_err(|e| warn!(payout_id = %id, error = %e, "Warmup rejected"))?;

        for rule in resolved {
            rule.run_warmup(&payout)?;
        }
        Ok(())
    }

    /// Apply every event the caller added or revised, then save once
    ///
    /// Returns the committed authoritative payout. An exact re-delivery returns
    /// the stored payout without saving.
    pub async fn commit(&self, incoming: &Payout) -> Result<Payout, PayoutError> {
        let _guard = self.locks.acquire(incoming.id).await?;
        let persisted = self.store.get(incoming.id).await?;

        let pending = new_events(&persisted.events, &incoming.events)?;
        if pending.is_empty() {
            debug!(payout_id = %incoming.id, "Nothing new to commit");
            return Ok(persisted);
        }
        debug!(payout_id = %incoming.id, new_events = pending.len(), "Committing events");

        let mut working = persisted;
        for event in pending {
            self.apply(&mut working, incoming, event).inspect_err(|e| {
                warn!(
                    payout_id = %incoming.id,
                    event_id = %event.id,
                    event = %event,
                    error = %e,
                    "Commit aborted"
                );
            })?;
        }

        self.store.save(&working).await?;
        info!(
            payout_id = %working.id,
            status = %working.status,
            events = working.events.len(),
            "Payout committed"
        );
        Ok(working)
    }

    /// Run one new event's rule against the working copy and splice it in
    fn apply(
        &self,
        working: &mut Payout,
        incoming: &Payout,
        event: &PayoutEvent,
    ) -> Result<(), PayoutError> {
        let key = TransitionKey::for_payout(working, event.event_type)?;
        let rule = self.table.resolve(&key, event.status)?;

        let payout_type = working.payout_type;
        let status = working.status;

        rule.run_update(working, incoming)?;
        rule.run_validate(working)?;
        rule.run_cleanup(working)?;

        if working.payout_type != payout_type {
            return Err(PayoutError::InvalidTransition(format!(
                "rule '{}' changed payout type {} -> {}",
                rule.description(),
                payout_type,
                working.payout_type
            )));
        }
        if !status.can_move_to(working.status) {
            return Err(PayoutError::InvalidTransition(format!(
                "rule '{}' moved payout status {} -> {}",
                rule.description(),
                status,
                working.status
            )));
        }

        working.splice_event(event.clone());
        info!(
            payout_id = %working.id,
            event_id = %event.id,
            from_type = %key.last_event_type,
            from_status = %key.last_event_status,
            to = %event,
            "Transition applied"
        );
        Ok(())
    }
}
