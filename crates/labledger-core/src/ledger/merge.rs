//! Natural-key merge of monthly ledger records.

use std::collections::HashMap;

use crate::models::ledger::{LedgerRecord, NaturalKey};

/// Merged record set with counts of what changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeResult {
    /// Every record, sorted by due date.
    pub records: Vec<LedgerRecord>,
    /// New records appended.
    pub inserted: usize,
    /// Records that replaced one with the same key.
    pub updated: usize,
}

/// Merge `new` into `existing`.
///
/// A record whose `(date_due, patient_name, total_cost)` key is already
/// present overwrites it in place; anything else is appended. The result is
/// stably sorted by due date with unparseable dates last, so merging the same
/// records twice gives the same output as merging them once.
pub fn merge(existing: Vec<LedgerRecord>, new: &[LedgerRecord]) -> MergeResult {
    let mut records = existing;
    let mut index: HashMap<NaturalKey, usize> = HashMap::with_capacity(records.len() + new.len());
    for (i, record) in records.iter().enumerate() {
        index.entry(record.natural_key()).or_insert(i);
    }

    let mut inserted = 0;
    let mut updated = 0;

    for record in new {
        let key = record.natural_key();
        match index.get(&key) {
            Some(&i) => {
                records[i] = record.clone();
                updated += 1;
            }
            None => {
                index.insert(key, records.len());
                records.push(record.clone());
                inserted += 1;
            }
        }
    }

    records.sort_by(|a, b| a.date_due.cmp(&b.date_due));

    MergeResult {
        records,
        inserted,
        updated,
    }
}
