use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::CacheError;
use crate::key::DatasetKey;
use crate::payload::Payload;
use crate::store::{check_kind, DatasetCache};

/// In-memory dataset cache backed by a `HashMap`.
///
/// Not persisted across runs. Same add-only semantics as the SQLite
/// store, which makes it the fixture of choice for loader tests.
///
/// # Concurrency
///
/// `get`, `contains` and `keys` take a read lock; `put` and `clear` take
/// the write lock. The duplicate check and the insert happen under the
/// same write lock, so racing writers see exactly one winner.
pub struct MemoryDatasetCache {
    entries: RwLock<HashMap<DatasetKey, Payload>>,
}

impl MemoryDatasetCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("dataset cache lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryDatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetCache for MemoryDatasetCache {
    fn get(&self, key: DatasetKey) -> Result<Option<Payload>, CacheError> {
        Ok(self
            .entries
            .read()
            .expect("dataset cache lock poisoned")
            .get(&key)
            .cloned())
    }

    fn put(&self, key: DatasetKey, payload: &Payload) -> Result<(), CacheError> {
        check_kind(key, payload)?;
        let mut entries = self.entries.write().expect("dataset cache lock poisoned");
        if entries.contains_key(&key) {
            return Err(CacheError::DuplicateKey {
                key: key.to_string(),
            });
        }
        entries.insert(key, payload.clone());
        Ok(())
    }

    fn contains(&self, key: DatasetKey) -> Result<bool, CacheError> {
        Ok(self
            .entries
            .read()
            .expect("dataset cache lock poisoned")
            .contains_key(&key))
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .expect("dataset cache lock poisoned")
            .keys()
            .map(ToString::to_string)
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn clear(&self) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().expect("dataset cache lock poisoned");
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Kind, Split};

    const LABELS: DatasetKey = DatasetKey {
        split: Split::Train,
        kind: Kind::Labels,
    };

    #[test]
    fn put_then_get() {
        let cache = MemoryDatasetCache::new();
        cache.put(LABELS, &Payload::Labels(vec![7, 3])).unwrap();
        assert_eq!(cache.get(LABELS).unwrap(), Some(Payload::Labels(vec![7, 3])));
        assert_eq!(cache.get_labels(Split::Train).unwrap(), Some(vec![7, 3]));
    }

    #[test]
    fn absent_key_is_none() {
        let cache = MemoryDatasetCache::new();
        assert_eq!(cache.get(LABELS).unwrap(), None);
        assert!(!cache.contains(LABELS).unwrap());
    }

    #[test]
    fn second_put_is_rejected_and_first_value_kept() {
        let cache = MemoryDatasetCache::new();
        cache.put(LABELS, &Payload::Labels(vec![1])).unwrap();
        let err = cache.put(LABELS, &Payload::Labels(vec![2])).unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(cache.get_labels(Split::Train).unwrap(), Some(vec![1]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn kind_must_match_key() {
        let cache = MemoryDatasetCache::new();
        let key = DatasetKey::new(Split::Train, Kind::Images);
        let err = cache.put(key, &Payload::Labels(vec![1])).unwrap_err();
        assert!(matches!(err, CacheError::KindMismatch { found: Kind::Labels, .. }));
    }

    #[test]
    fn racing_puts_have_exactly_one_winner() {
        let cache = MemoryDatasetCache::new();
        let results: Vec<Result<(), CacheError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8u8)
                .map(|i| {
                    let cache = &cache;
                    s.spawn(move || cache.put(LABELS, &Payload::Labels(vec![i])))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| r.as_ref().is_err_and(CacheError::is_duplicate_key))
                .count(),
            7
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_and_clear() {
        let cache = MemoryDatasetCache::new();
        cache.put(LABELS, &Payload::Labels(vec![1])).unwrap();
        cache
            .put(DatasetKey::new(Split::Test, Kind::Labels), &Payload::Labels(vec![2]))
            .unwrap();
        assert_eq!(cache.keys().unwrap(), vec!["test_labels", "train_labels"]);
        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.is_empty());
    }
}
