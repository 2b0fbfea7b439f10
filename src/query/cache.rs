//! Compute-once categorization memo.
//!
//! Keyed by (record identity, rule version) so a rule-table update can
//! never serve stale labels. The record itself is never mutated; derived
//! results live only in this side table, which preserves the pure-function
//! property the parallel fallback path depends on.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::analysis::categorizer::CategorizedBuild;
use crate::data::record::RecordKey;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    record: RecordKey,
    rule_version: String,
}

/// Concurrent-read, compute-once categorization cache.
#[derive(Debug, Default)]
pub struct CategorizationCache {
    slots: RwLock<HashMap<CacheKey, Arc<OnceLock<CategorizedBuild>>>>,
}

impl CategorizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached categorization for the key, computing it on first
    /// demand. Concurrent callers for the same key block on the first
    /// computation instead of racing to recompute.
    pub fn get_or_compute<F>(
        &self,
        record: &RecordKey,
        rule_version: &str,
        compute: F,
    ) -> CategorizedBuild
    where
        F: FnOnce() -> CategorizedBuild,
    {
        let key = CacheKey {
            record: record.clone(),
            rule_version: rule_version.to_string(),
        };

        let slot = {
            let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
            slots.get(&key).cloned()
        };
        let slot = match slot {
            Some(slot) => slot,
            None => {
                let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
                slots
                    .entry(key)
                    .or_insert_with(|| Arc::new(OnceLock::new()))
                    .clone()
            }
        };

        slot.get_or_init(compute).clone()
    }

    /// Number of cached entries, across all rule versions.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
