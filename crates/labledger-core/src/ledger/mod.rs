//! Monthly ledgers: storage, merging and per-bucket locking.

mod csv_store;
mod locks;
mod memory;
pub mod merge;

pub use csv_store::{CsvLedgerStore, CURRENT_HEADERS, LEGACY_HEADERS};
pub use locks::BucketLocks;
pub use memory::MemoryLedgerStore;
pub use merge::{merge, MergeResult};

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::models::ledger::{checked_total, LedgerRecord, MonthLabel};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Persistence for month buckets.
pub trait LedgerStore: Send + Sync {
    /// Records of a bucket; an empty list when the bucket does not exist.
    fn load(&self, label: &MonthLabel) -> Result<Vec<LedgerRecord>>;

    /// Replace the bucket's records.
    fn save(&self, label: &MonthLabel, records: &[LedgerRecord]) -> Result<()>;

    /// Delete the bucket. Returns whether anything was removed.
    fn remove(&self, label: &MonthLabel) -> Result<bool>;

    /// Human-readable location of the bucket, for log and CLI output.
    fn describe(&self, label: &MonthLabel) -> String;
}

/// Summary of one merge into a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub label: MonthLabel,
    pub inserted: usize,
    pub updated: usize,
    /// Sum of `total_cost` over the whole bucket after the merge.
    pub total: Decimal,
    /// Bucket contents after the merge, sorted by due date.
    pub records: Vec<LedgerRecord>,
}

/// A ledger store with exclusive read-modify-write per bucket.
pub struct Ledger<S: LedgerStore> {
    store: S,
    locks: BucketLocks,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: BucketLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a bucket while holding its lock.
    pub fn load(&self, label: &MonthLabel) -> Result<Vec<LedgerRecord>> {
        let lock = self.locks.lock_for(label);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.store.load(label)
    }

    /// Merge `new` into the bucket and persist the result.
    pub fn merge_and_persist(
        &self,
        label: &MonthLabel,
        new: &[LedgerRecord],
    ) -> Result<MergeOutcome> {
        let lock = self.locks.lock_for(label);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let existing = self.store.load(label)?;
        debug!("Loaded {} existing records for {}", existing.len(), label);

        let MergeResult {
            records,
            inserted,
            updated,
        } = merge(existing, new);
        let total = checked_total(&records)
            .ok_or_else(|| LedgerError::TotalOutOfRange(label.to_string()))?;
        self.store.save(label, &records)?;

        info!(
            "Merged {} records into {}: {} new, {} updated, {} total",
            new.len(),
            self.store.describe(label),
            inserted,
            updated,
            records.len()
        );

        Ok(MergeOutcome {
            label: label.clone(),
            inserted,
            updated,
            total,
            records,
        })
    }

    /// Delete a bucket.
    pub fn reset(&self, label: &MonthLabel) -> Result<bool> {
        let lock = self.locks.lock_for(label);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let removed = self.store.remove(label)?;
        if removed {
            info!("Removed ledger {}", self.store.describe(label));
        }
        Ok(removed)
    }
}
