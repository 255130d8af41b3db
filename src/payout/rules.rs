//! Built-in payout lifecycles
//!
//! # PIX
//!
//! ```text
//! COUNTERPARTY:PROCESSING → COUNTERPARTY:SUCCESS → WITHDRAW:SUCCESS (payout COMPLETED)
//! ```
//!
//! TED registers no edges yet, so every TED transition is rejected.

use super::state::{EventStatus, PayoutStatus};
use super::table::{TransitionRule, TransitionTableBuilder};
use super::types::{EventType, Payout, PayoutType};

/// Register every built-in lifecycle
pub fn standard(builder: TransitionTableBuilder) -> TransitionTableBuilder {
    pix(builder)
}

/// PIX: resolve the counterparty, then withdraw
///
/// Neither edge has a warm-up hook.
pub fn pix(builder: TransitionTableBuilder) -> TransitionTableBuilder {
    builder
        .edge(
            (PayoutType::Pix, PayoutStatus::Processing),
            (EventType::Counterparty, EventStatus::Processing),
            (EventType::Counterparty, EventStatus::Success),
            TransitionRule::new("counterparty resolved; no clean-up")
                .with_update(copy_counterparty)
                .with_validate(require_counterparty),
        )
        .edge(
            (PayoutType::Pix, PayoutStatus::Processing),
            (EventType::Counterparty, EventStatus::Success),
            (EventType::Withdraw, EventStatus::Success),
            TransitionRule::new("withdraw executed; completes the payout")
                .with_update(copy_withdraw)
                .with_validate(require_withdraw)
                .with_cleanup(complete_payout),
        )
}

fn copy_counterparty(authoritative: &mut Payout, incoming: &Payout) -> Result<(), String> {
    authoritative.counterparty = incoming.counterparty.clone();
    Ok(())
}

fn require_counterparty(payout: &Payout) -> Result<(), String> {
    match payout.counterparty {
        Some(_) => Ok(()),
        None => Err("empty counterparty".to_string()),
    }
}

fn copy_withdraw(authoritative: &mut Payout, incoming: &Payout) -> Result<(), String> {
    authoritative.withdraw = incoming.withdraw.clone();
    Ok(())
}

fn require_withdraw(payout: &Payout) -> Result<(), String> {
    match payout.withdraw {
        Some(_) => Ok(()),
        None => Err("withdraw is empty".to_string()),
    }
}

fn complete_payout(payout: &mut Payout) -> Result<(), String> {
    payout.complete();
    Ok(())
}
