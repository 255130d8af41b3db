//! Transition Table
//!
//! The payout state machine encoded as data: one map from a composite
//! [`TransitionKey`] to the set of reachable next-event statuses, each carrying
//! a [`TransitionRule`].
//!
//! # Key
//!
//! ```text
//! (payout type, payout status, last event type, last event status, next event type)
//!     → { next event status → rule }
//! ```
//!
//! The table is built once and never mutated afterwards, so concurrent readers
//! share it through an `Arc` without synchronization.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::error::PayoutError;
use super::rules;
use super::state::{EventStatus, PayoutStatus};
use super::types::{EventType, Payout, PayoutType};

/// Pre-flight hook, may not mutate the payout
pub type WarmupHook = fn(&Payout) -> Result<(), String>;
/// Check on the would-be authoritative state
pub type ValidateHook = fn(&Payout) -> Result<(), String>;
/// Copy caller-supplied fields `(authoritative, incoming)` onto the authoritative copy
pub type UpdateHook = fn(&mut Payout, &Payout) -> Result<(), String>;
/// Post-validation adjustment of the authoritative copy
pub type CleanupHook = fn(&mut Payout) -> Result<(), String>;

/// The four hook kinds a rule may implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Warmup,
    Validate,
    Update,
    Cleanup,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Warmup => "warmup",
            HookKind::Validate => "validate",
            HookKind::Update => "update",
            HookKind::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hook bundle governing one legal edge
///
/// Every hook is optional. An absent hook is a no-op; in particular an absent
/// validate hook passes, leaving only the structural check that the edge exists.
pub struct TransitionRule {
    description: &'static str,
    warmup: Option<WarmupHook>,
    validate: Option<ValidateHook>,
    update: Option<UpdateHook>,
    cleanup: Option<CleanupHook>,
}

impl TransitionRule {
    /// Create a rule with no hooks
    pub fn new(description: &'static str) -> Self {
        Self {
            description,
            warmup: None,
            validate: None,
            update: None,
            cleanup: None,
        }
    }

    pub fn with_warmup(mut self, hook: WarmupHook) -> Self {
        self.warmup = Some(hook);
        self
    }

    pub fn with_validate(mut self, hook: ValidateHook) -> Self {
        self.validate = Some(hook);
        self
    }

    pub fn with_update(mut self, hook: UpdateHook) -> Self {
        self.update = Some(hook);
        self
    }

    pub fn with_cleanup(mut self, hook: CleanupHook) -> Self {
        self.cleanup = Some(hook);
        self
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Hook kinds this rule implements, in execution order
    pub fn capabilities(&self) -> Vec<HookKind> {
        let mut kinds = Vec::with_capacity(4);
        if self.warmup.is_some() {
            kinds.push(HookKind::Warmup);
        }
        if self.update.is_some() {
            kinds.push(HookKind::Update);
        }
        if self.validate.is_some() {
            kinds.push(HookKind::Validate);
        }
        if self.cleanup.is_some() {
            kinds.push(HookKind::Cleanup);
        }
        kinds
    }

    pub(crate) fn run_warmup(&self, payout: &Payout) -> Result<(), PayoutError> {
        match self.warmup {
            Some(hook) => hook(payout).map_err(|reason| PayoutError::HookFailed {
                hook: HookKind::Warmup,
                reason,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn run_update(
        &self,
        authoritative: &mut Payout,
        incoming: &Payout,
    ) -> Result<(), PayoutError> {
        match self.update {
            Some(hook) => {
                hook(authoritative, incoming).map_err(|reason| PayoutError::HookFailed {
                    hook: HookKind::Update,
                    reason,
                })
            }
            None => Ok(()),
        }
    }

    pub(crate) fn run_validate(&self, payout: &Payout) -> Result<(), PayoutError> {
        match self.validate {
            Some(hook) => hook(payout).map_err(PayoutError::ValidationFailed),
            None => Ok(()),
        }
    }

    pub(crate) fn run_cleanup(&self, payout: &mut Payout) -> Result<(), PayoutError> {
        match self.cleanup {
            Some(hook) => hook(payout).map_err(|reason| PayoutError::HookFailed {
                hook: HookKind::Cleanup,
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for TransitionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRule")
            .field("description", &self.description)
            .field("hooks", &self.capabilities())
            .finish()
    }
}

/// Composite lookup key: current payout state plus the candidate next event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    pub payout_type: PayoutType,
    pub payout_status: PayoutStatus,
    pub last_event_type: EventType,
    pub last_event_status: EventStatus,
    pub next_event_type: EventType,
}

impl TransitionKey {
    /// Build the key for `next_event_type` from a payout's current state
    ///
    /// Fails with `InvalidTransition` if the payout has no events.
    pub fn for_payout(payout: &Payout, next_event_type: EventType) -> Result<Self, PayoutError> {
        let last = payout.last_event().ok_or_else(|| {
            PayoutError::InvalidTransition(format!("payout {} has no events", payout.id))
        })?;

        Ok(Self {
            payout_type: payout.payout_type,
            payout_status: payout.status,
            last_event_type: last.event_type,
            last_event_status: last.status,
            next_event_type,
        })
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}:{} -> {}",
            self.payout_type,
            self.payout_status,
            self.last_event_type,
            self.last_event_status,
            self.next_event_type
        )
    }
}

/// Reachable next-event statuses for one key
pub type RuleSet = BTreeMap<EventStatus, TransitionRule>;

/// Immutable registry of legal payout transitions
#[derive(Debug, Default)]
pub struct TransitionTable {
    entries: FxHashMap<TransitionKey, RuleSet>,
}

static STANDARD_TABLE: Lazy<Arc<TransitionTable>> = Lazy::new(|| {
    Arc::new(
        rules::standard(TransitionTable::builder())
            .build()
            .expect("standard transition table has duplicate edges"),
    )
});

impl TransitionTable {
    pub fn builder() -> TransitionTableBuilder {
        TransitionTableBuilder::default()
    }

    /// Process-wide table holding the built-in payout lifecycles
    pub fn standard() -> Arc<TransitionTable> {
        STANDARD_TABLE.clone()
    }

    /// Next-event statuses registered for `key`
    ///
    /// Any unknown segment of the key path fails with `InvalidTransition`;
    /// an empty rule set is never returned.
    pub fn lookup(&self, key: &TransitionKey) -> Result<&RuleSet, PayoutError> {
        match self.entries.get(key) {
            Some(rules) if !rules.is_empty() => Ok(rules),
            _ => Err(PayoutError::InvalidTransition(format!("no path for {}", key))),
        }
    }

    /// Rule for reaching `next_status` from `key`
    pub fn resolve(
        &self,
        key: &TransitionKey,
        next_status: EventStatus,
    ) -> Result<&TransitionRule, PayoutError> {
        self.lookup(key)?.get(&next_status).ok_or_else(|| {
            PayoutError::InvalidTransition(format!("no rule for {}:{}", key, next_status))
        })
    }

    /// Every registered edge, for auditing
    pub fn edges(&self) -> impl Iterator<Item = (&TransitionKey, EventStatus, &TransitionRule)> {
        self.entries
            .iter()
            .flat_map(|(key, rules)| rules.iter().map(move |(status, rule)| (key, *status, rule)))
    }

    /// Number of registered edges
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects edges and rejects duplicates at build time
#[derive(Default)]
pub struct TransitionTableBuilder {
    entries: FxHashMap<TransitionKey, RuleSet>,
    duplicates: Vec<String>,
}

impl TransitionTableBuilder {
    /// Register the edge `(payout, from) -> to`
    pub fn edge(
        mut self,
        payout: (PayoutType, PayoutStatus),
        from: (EventType, EventStatus),
        to: (EventType, EventStatus),
        rule: TransitionRule,
    ) -> Self {
        let key = TransitionKey {
            payout_type: payout.0,
            payout_status: payout.1,
            last_event_type: from.0,
            last_event_status: from.1,
            next_event_type: to.0,
        };

        let rules = self.entries.entry(key).or_default();
        if rules.contains_key(&to.1) {
            self.duplicates.push(format!("{}:{}", key, to.1));
        } else {
            rules.insert(to.1, rule);
        }
        self
    }

    pub fn build(self) -> Result<TransitionTable, PayoutError> {
        if !self.duplicates.is_empty() {
            return Err(PayoutError::DuplicateTransition(self.duplicates.join(", ")));
        }
        Ok(TransitionTable {
            entries: self.entries,
        })
    }
}
