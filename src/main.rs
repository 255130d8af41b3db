//! Payout FSM demo
//!
//! Drives one PIX payout through its whole lifecycle against the configured
//! store:
//!
//! ```text
//! create → warmup(COUNTERPARTY) → resolve counterparty → commit
//!        → warmup(WITHDRAW)     → execute withdraw     → commit (COMPLETED)
//! ```

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use payout_fsm::config::{AppConfig, StoreBackend, StoreConfig};
use payout_fsm::payout::{
    Counterparty, EventStatus, EventType, JsonFilePayoutStore, MemoryPayoutStore, Payout,
    PayoutStore, PayoutType, PgPayoutStore, TransitionEngine, Withdraw,
};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn PayoutStore>> {
    Ok(match config.backend {
        StoreBackend::Memory => Arc::new(MemoryPayoutStore::new()),
        StoreBackend::Json => Arc::new(JsonFilePayoutStore::new(&config.json_path)),
        StoreBackend::Postgres => {
            let url = config
                .postgres_url
                .as_deref()
                .context("store.postgres_url is required for the postgres backend")?;
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            let store = PgPayoutStore::new(pool);
            store.init_schema().await?;
            Arc::new(store)
        }
    })
}

// ============================================================
// SIMULATED BUSINESS STEPS
// ============================================================

fn resolve_counterparty(payout: &mut Payout) -> anyhow::Result<()> {
    payout.counterparty = Some(Counterparty {
        name: "Murillo".to_string(),
        age: 18,
    });
    payout.revise_last_event(EventStatus::Success)?;
    Ok(())
}

fn execute_withdraw(payout: &mut Payout) {
    payout.withdraw = Some(Withdraw {
        amount: payout.amount,
        created_at: Utc::now(),
    });
    payout.push_event(EventType::Withdraw, EventStatus::Success);
}

// ============================================================
// MAIN
// ============================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = payout_fsm::logging::init_logging(&app_config);

    info!(env = %env, store = ?app_config.store.backend, "Starting payout FSM");

    let store = build_store(&app_config.store).await?;
    let engine = TransitionEngine::from_config(store, &app_config.engine);

    let mut payout = Payout::new(PayoutType::Pix, Decimal::from(10), EventType::Counterparty)?;
    engine.create(&payout).await?;

    engine
        .warmup(payout.id, EventType::Counterparty, &[EventStatus::Success])
        .await?;
    resolve_counterparty(&mut payout)?;
    engine.commit(&payout).await?;

    engine
        .warmup(payout.id, EventType::Withdraw, &[EventStatus::Success])
        .await?;
    execute_withdraw(&mut payout);
    let committed = engine.commit(&payout).await?;

    info!(
        payout_id = %committed.id,
        status = %committed.status,
        events = committed.events.len(),
        "Payout finished"
    );
    println!("{}", serde_json::to_string_pretty(&committed)?);

    Ok(())
}
