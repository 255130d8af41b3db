use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use payout_fsm::config::{AppConfig, StoreBackend};
use payout_fsm::payout::{
    Counterparty, EventStatus, EventType, HookKind, JsonFilePayoutStore, MemoryPayoutStore,
    Payout, PayoutError, PayoutStatus, PayoutType, TransitionEngine, TransitionTable, Withdraw,
};

fn resolve_counterparty(payout: &mut Payout) {
    payout.counterparty = Some(Counterparty {
        name: "Murillo".to_string(),
        age: 18,
    });
    payout.revise_last_event(EventStatus::Success).unwrap();
}

fn execute_withdraw(payout: &mut Payout) {
    payout.withdraw = Some(Withdraw {
        amount: payout.amount,
        created_at: Utc::now(),
    });
    payout.push_event(EventType::Withdraw, EventStatus::Success);
}

#[test]
fn qa_standard_table_is_auditable() {
    let table = TransitionTable::standard();

    let mut edges: Vec<String> = table
        .edges()
        .map(|(key, status, rule)| {
            let hooks: Vec<&str> = rule.capabilities().iter().map(HookKind::as_str).collect();
            format!("{} :{} [{}]", key, status, hooks.join(","))
        })
        .collect();
    edges.sort();

    assert_eq!(
        edges,
        vec![
            "PIX/PROCESSING COUNTERPARTY:PROCESSING -> COUNTERPARTY :SUCCESS [update,validate]",
            "PIX/PROCESSING COUNTERPARTY:SUCCESS -> WITHDRAW :SUCCESS [update,validate,cleanup]",
        ]
    );
    assert!(table.edges().all(|(key, _, _)| key.payout_type == PayoutType::Pix));
}

#[test]
fn qa_test_config_loads() {
    let config = AppConfig::load("test").unwrap();
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.engine.lock_timeout_ms, 500);
}

#[tokio::test]
async fn qa_pix_lifecycle_on_json_store() {
    let dir = std::env::temp_dir().join(format!("payout_fsm_it_{}", ulid::Ulid::new()));
    let path = dir.join("payouts.json");
    let engine = TransitionEngine::new(
        Arc::new(JsonFilePayoutStore::new(&path)),
        TransitionTable::standard(),
        std::time::Duration::from_secs(1),
    );

    let mut payout =
        Payout::new(PayoutType::Pix, Decimal::new(2500, 2), EventType::Counterparty).unwrap();
    engine.create(&payout).await.unwrap();

    engine
        .warmup(payout.id, EventType::Counterparty, &[EventStatus::Success])
        .await
        .unwrap();
    resolve_counterparty(&mut payout);
    engine.commit(&payout).await.unwrap();

    engine
        .warmup(payout.id, EventType::Withdraw, &[EventStatus::Success])
        .await
        .unwrap();
    execute_withdraw(&mut payout);
    engine.commit(&payout).await.unwrap();

    // A fresh store over the same file sees the committed record
    let reopened = TransitionEngine::new(
        Arc::new(JsonFilePayoutStore::new(&path)),
        TransitionTable::standard(),
        std::time::Duration::from_secs(1),
    );
    let stored = reopened.get(payout.id).await.unwrap();
    assert_eq!(stored.status, PayoutStatus::Completed);
    assert_eq!(stored.events.len(), 2);
    assert_eq!(stored.amount, Decimal::new(2500, 2));

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn qa_revision_and_append_diff_through_engine() {
    let engine = TransitionEngine::new(
        Arc::new(MemoryPayoutStore::new()),
        TransitionTable::standard(),
        std::time::Duration::from_secs(1),
    );
    let mut payout =
        Payout::new(PayoutType::Pix, Decimal::from(10), EventType::Counterparty).unwrap();
    engine.create(&payout).await.unwrap();
    let first_id = payout.events[0].id;

    // Same event id, new status: revised in place
    resolve_counterparty(&mut payout);
    let committed = engine.commit(&payout).await.unwrap();
    assert_eq!(committed.events.len(), 1);
    assert_eq!(committed.events[0].id, first_id);
    assert_eq!(committed.events[0].status, EventStatus::Success);

    // New event id: appended
    execute_withdraw(&mut payout);
    let committed = engine.commit(&payout).await.unwrap();
    assert_eq!(committed.events.len(), 2);
    assert_eq!(committed.events[0].id, first_id);
    assert_eq!(committed.events[1].id, payout.events[1].id);
}

#[tokio::test]
async fn qa_withdraw_first_is_invalid() {
    let engine = TransitionEngine::new(
        Arc::new(MemoryPayoutStore::new()),
        TransitionTable::standard(),
        std::time::Duration::from_secs(1),
    );
    let mut payout =
        Payout::new(PayoutType::Pix, Decimal::from(10), EventType::Counterparty).unwrap();
    engine.create(&payout).await.unwrap();

    execute_withdraw(&mut payout);
    let err = engine.commit(&payout).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");
    assert!(!err.is_retryable());
    assert!(matches!(err, PayoutError::InvalidTransition(_)));
}
