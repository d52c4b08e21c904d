//! In-process store snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::store::{ConfigEntry, KeyValueStore};

/// Lock-free store backed by an atomically swapped map.
///
/// Readers always observe a complete snapshot; a concurrent `replace` is
/// visible to lookups that start after it.
#[derive(Debug)]
pub struct MemoryStore {
    entries: ArcSwap<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new(entries: impl IntoIterator<Item = ConfigEntry>) -> Self {
        Self {
            entries: ArcSwap::from_pointee(Self::collect(entries)),
        }
    }

    /// Convenience constructor for fixed `(key, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| ConfigEntry::new(k, v)))
    }

    /// Swap in a new snapshot. Later entries win on duplicate keys.
    pub fn replace(&self, entries: impl IntoIterator<Item = ConfigEntry>) {
        self.entries.store(Arc::new(Self::collect(entries)));
    }

    /// Current snapshot as entries sorted by key.
    pub fn entries(&self) -> Vec<ConfigEntry> {
        let snapshot = self.entries.load();
        let mut entries: Vec<ConfigEntry> = snapshot
            .iter()
            .map(|(k, v)| ConfigEntry::new(k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect(entries: impl IntoIterator<Item = ConfigEntry>) -> HashMap<String, String> {
        entries.into_iter().map(|e| (e.key, e.value)).collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .load()
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::keys;

    #[test]
    fn test_get_known_and_unknown() {
        let store = MemoryStore::from_pairs([(keys::SITE_BASE_PATH, "/site")]);
        assert_eq!(store.get(keys::SITE_BASE_PATH).as_deref(), Some("/site"));
        assert_eq!(store.get(keys::SITE_VERSION), None);
    }

    #[test]
    fn test_empty_value_is_absent() {
        let store = MemoryStore::from_pairs([(keys::API_PATH, "")]);
        assert_eq!(store.get(keys::API_PATH), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_swaps_snapshot() {
        let store = MemoryStore::from_pairs([(keys::SITE_VERSION, "v1.0.0")]);
        store.replace([ConfigEntry::new(keys::SITE_VERSION, "v1.1.0")]);
        assert_eq!(store.get(keys::SITE_VERSION).as_deref(), Some("v1.1.0"));
    }

    #[test]
    fn test_entries_sorted() {
        let store = MemoryStore::from_pairs([("b", "2"), ("a", "1")]);
        let keys: Vec<_> = store.entries().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_reads_during_replace() {
        let store = Arc::new(MemoryStore::from_pairs([(keys::SITE_VERSION, "v1.0.0")]));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let v = store.get(keys::SITE_VERSION).unwrap();
                        assert!(v == "v1.0.0" || v == "v2.0.0");
                    }
                })
            })
            .collect();

        store.replace([ConfigEntry::new(keys::SITE_VERSION, "v2.0.0")]);
        for r in readers {
            r.join().unwrap();
        }
    }
}
