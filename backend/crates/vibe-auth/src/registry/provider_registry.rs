use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use vibe_commons::{normalize_issuer, ProviderKey, ProviderRecord};

/// Immutable provider table; replaced wholesale, never mutated.
#[derive(Default)]
struct ProviderTable {
    by_key: HashMap<ProviderKey, Arc<ProviderRecord>>,
    by_issuer: HashMap<String, Arc<ProviderRecord>>,
}

/// Read-mostly lookup of provider records by issuer or key.
///
/// Readers load the current snapshot without locking. [`ProviderRegistry::replace`]
/// builds a complete new table and swaps it in, so a reader sees either the
/// old set or the new one, never a mix.
pub struct ProviderRegistry {
    table: ArcSwap<ProviderTable>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(ProviderTable::default()),
        }
    }

    /// Swap in a new provider set.
    ///
    /// If two records share an issuer (case-insensitive, trailing `/` ignored)
    /// the later one wins and the earlier is dropped entirely.
    pub fn replace(&self, records: Vec<ProviderRecord>) {
        let mut table = ProviderTable::default();

        for record in records {
            let record = Arc::new(record);
            let issuer = record.issuer_index();

            if let Some(previous) = table.by_issuer.insert(issuer, record.clone()) {
                if previous.key != record.key {
                    log::warn!(
                        "Providers '{}' and '{}' share issuer '{}'; keeping '{}'",
                        previous.key,
                        record.key,
                        record.issuer,
                        record.key
                    );
                    table.by_key.remove(&previous.key);
                }
            }

            if let Some(previous) = table.by_key.insert(record.key.clone(), record.clone()) {
                let previous_issuer = previous.issuer_index();
                if previous_issuer != record.issuer_index() {
                    table.by_issuer.remove(&previous_issuer);
                }
            }
        }

        log::debug!("Provider registry replaced with {} providers", table.by_key.len());
        self.table.store(Arc::new(table));
    }

    pub fn get_by_issuer(&self, issuer: &str) -> Option<Arc<ProviderRecord>> {
        self.table.load().by_issuer.get(&normalize_issuer(issuer)).cloned()
    }

    pub fn get_by_key(&self, key: &ProviderKey) -> Option<Arc<ProviderRecord>> {
        self.table.load().by_key.get(key).cloned()
    }

    /// All current records, ordered by key.
    pub fn snapshot(&self) -> Vec<Arc<ProviderRecord>> {
        let table = self.table.load();
        let mut records: Vec<_> = table.by_key.values().cloned().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    pub fn len(&self) -> usize {
        self.table.load().by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
