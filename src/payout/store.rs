//! Payout Persistence Contract
//!
//! The engine only needs two operations: fetch the authoritative record by id
//! and save a whole record atomically. A reader must never observe a
//! half-written payout.

use async_trait::async_trait;
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::PayoutError;
use super::types::{Payout, PayoutId};

/// Storage for authoritative payout records
#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Get backend name for logging
    fn name(&self) -> &'static str;

    /// Fetch the authoritative payout, `NotFound` if absent
    async fn get(&self, id: PayoutId) -> Result<Payout, PayoutError>;

    /// Persist the whole payout, replacing any previous record
    async fn save(&self, payout: &Payout) -> Result<(), PayoutError>;
}

/// In-process store
#[derive(Default)]
pub struct MemoryPayoutStore {
    payouts: DashMap<PayoutId, Payout>,
}

impl MemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.payouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payouts.is_empty()
    }
}

#[async_trait]
impl PayoutStore for MemoryPayoutStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, id: PayoutId) -> Result<Payout, PayoutError> {
        self.payouts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(PayoutError::NotFound(id))
    }

    async fn save(&self, payout: &Payout) -> Result<(), PayoutError> {
        self.payouts.insert(payout.id, payout.clone());
        Ok(())
    }
}

/// Single JSON document holding every payout, keyed by id
///
/// Saves write a sibling temp file and rename it over the original.
pub struct JsonFilePayoutStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePayoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<FxHashMap<PayoutId, Payout>, PayoutError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(FxHashMap::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FxHashMap::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, payouts: &FxHashMap<PayoutId, Payout>) -> Result<(), PayoutError> {
        let bytes = serde_json::to_vec_pretty(payouts)?;
        let tmp = self.path.with_extension("json.tmp");

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PayoutStore for JsonFilePayoutStore {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn get(&self, id: PayoutId) -> Result<Payout, PayoutError> {
        let mut payouts = self.read_all().await?;
        payouts.remove(&id).ok_or(PayoutError::NotFound(id))
    }

    async fn save(&self, payout: &Payout) -> Result<(), PayoutError> {
        // Read-modify-write of the shared document must not interleave.
        let _guard = self.write_lock.lock().await;

        let mut payouts = self.read_all().await?;
        payouts.insert(payout.id, payout.clone());
        self.write_all(&payouts).await?;

        debug!(
            payout_id = %payout.id,
            path = %self.path.display(),
            total = payouts.len(),
            "Payout written"
        );
        Ok(())
    }
}
