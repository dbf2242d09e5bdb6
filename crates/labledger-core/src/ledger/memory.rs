//! In-memory ledger store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::ledger::{LedgerRecord, MonthLabel};

use super::{LedgerStore, Result};

/// Keeps buckets in a map. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    buckets: RwLock<HashMap<MonthLabel, Vec<LedgerRecord>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self, label: &MonthLabel) -> Result<Vec<LedgerRecord>> {
        let buckets = self
            .buckets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(buckets.get(label).cloned().unwrap_or_default())
    }

    fn save(&self, label: &MonthLabel, records: &[LedgerRecord]) -> Result<()> {
        let mut buckets = self
            .buckets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        buckets.insert(label.clone(), records.to_vec());
        Ok(())
    }

    fn remove(&self, label: &MonthLabel) -> Result<bool> {
        let mut buckets = self
            .buckets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(buckets.remove(label).is_some())
    }

    fn describe(&self, label: &MonthLabel) -> String {
        format!("memory:{}", label)
    }
}
