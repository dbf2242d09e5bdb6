//! Per-bucket exclusive locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::ledger::MonthLabel;

/// One mutex per month bucket.
///
/// Holding a bucket's lock is required for the whole load/merge/save cycle;
/// different buckets never contend.
#[derive(Debug, Default)]
pub struct BucketLocks {
    locks: Mutex<HashMap<MonthLabel, Arc<Mutex<()>>>>,
}

impl BucketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `label`, created on first use.
    pub fn lock_for(&self, label: &MonthLabel) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(label.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
