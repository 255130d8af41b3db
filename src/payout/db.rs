//! PostgreSQL Payout Store
//!
//! One row per payout. The full record lives in `body` as JSON; type, status and
//! amount are mirrored into columns for querying. A save is a single upsert, so
//! readers see either the old row or the new one.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use super::error::PayoutError;
use super::store::PayoutStore;
use super::types::{Payout, PayoutId};

const CREATE_PAYOUTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS payouts_tb (
    payout_id   TEXT PRIMARY KEY,
    payout_type TEXT NOT NULL,
    status      TEXT NOT NULL,
    amount      NUMERIC NOT NULL,
    body        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Payout store backed by `payouts_tb`
pub struct PgPayoutStore {
    pool: PgPool,
}

impl PgPayoutStore {
    /// Create a new PgPayoutStore with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create `payouts_tb` if missing
    pub async fn init_schema(&self) -> Result<(), PayoutError> {
        sqlx::query(CREATE_PAYOUTS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PayoutStore for PgPayoutStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, id: PayoutId) -> Result<Payout, PayoutError> {
        let row = sqlx::query("SELECT body FROM payouts_tb WHERE payout_id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.try_get("body")?;
                Ok(serde_json::from_str(&body)?)
            }
            None => Err(PayoutError::NotFound(id)),
        }
    }

    async fn save(&self, payout: &Payout) -> Result<(), PayoutError> {
        let body = serde_json::to_string(payout)?;

        sqlx::query(
            r#"
            INSERT INTO payouts_tb (payout_id, payout_type, status, amount, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (payout_id) DO UPDATE
            SET status = EXCLUDED.status, body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(payout.id.to_string())
        .bind(payout.payout_type.as_str())
        .bind(payout.status.as_str())
        .bind(payout.amount)
        .bind(body)
        .execute(&self.pool)
        .await?;

        debug!(payout_id = %payout.id, status = %payout.status, "Payout row upserted");
        Ok(())
    }
}
