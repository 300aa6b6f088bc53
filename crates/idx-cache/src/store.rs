use idx_decoder::ImageRecords;

use crate::error::CacheError;
use crate::key::{DatasetKey, Kind, Split};
use crate::payload::Payload;

/// Persistent store of whole decoded datasets, keyed by `(split, kind)`.
///
/// The store is add-only. An entry, once written, is an immutable
/// snapshot; writing the same key again fails with
/// [`CacheError::DuplicateKey`] instead of overwriting. Two concurrent
/// writers for one key therefore resolve to exactly one stored entry and
/// one duplicate-key error, which the loser is expected to ignore.
///
/// All methods take `&self`; implementations synchronise internally and
/// must be `Send + Sync` so the loader can call them from blocking tasks.
///
/// ```text
/// Miss:  get(key) ─▶ None ─▶ fetch + decode ─▶ put(key, payload)
/// Hit:   get(key) ─▶ Some(payload)   (no fetch, no decode)
/// ```
pub trait DatasetCache: Send + Sync {
    /// Look up a dataset. A missing entry is `Ok(None)`, never an error.
    ///
    /// # Errors
    ///
    /// Store failures, or [`CacheError::Corrupt`] if the entry exists but
    /// does not decode.
    fn get(&self, key: DatasetKey) -> Result<Option<Payload>, CacheError>;

    /// Store a dataset under a key that must not exist yet.
    ///
    /// # Errors
    ///
    /// - [`CacheError::DuplicateKey`] if the key is already present.
    /// - [`CacheError::KindMismatch`] if `payload.kind() != key.kind`.
    /// - Store failures.
    fn put(&self, key: DatasetKey, payload: &Payload) -> Result<(), CacheError>;

    /// # Errors
    ///
    /// Store failures.
    fn contains(&self, key: DatasetKey) -> Result<bool, CacheError>;

    /// Every stored key, as rendered strings, sorted.
    ///
    /// # Errors
    ///
    /// Store failures.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Drop every entry; returns how many were removed.
    ///
    /// # Errors
    ///
    /// Store failures.
    fn clear(&self) -> Result<usize, CacheError>;

    /// Typed lookup of an image collection.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    fn get_images(&self, split: Split) -> Result<Option<ImageRecords>, CacheError> {
        let key = DatasetKey::new(split, Kind::Images);
        match self.get(key)? {
            Some(Payload::Images(records)) => Ok(Some(records)),
            Some(Payload::Labels(_)) => Err(CacheError::KindMismatch {
                key: key.to_string(),
                found: Kind::Labels,
            }),
            None => Ok(None),
        }
    }

    /// Typed lookup of a label sequence.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    fn get_labels(&self, split: Split) -> Result<Option<Vec<u8>>, CacheError> {
        let key = DatasetKey::new(split, Kind::Labels);
        match self.get(key)? {
            Some(Payload::Labels(labels)) => Ok(Some(labels)),
            Some(Payload::Images(_)) => Err(CacheError::KindMismatch {
                key: key.to_string(),
                found: Kind::Images,
            }),
            None => Ok(None),
        }
    }
}

pub(crate) fn check_kind(key: DatasetKey, payload: &Payload) -> Result<(), CacheError> {
    if payload.kind() == key.kind {
        Ok(())
    } else {
        Err(CacheError::KindMismatch {
            key: key.to_string(),
            found: payload.kind(),
        })
    }
}
