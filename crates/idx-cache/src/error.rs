use std::path::PathBuf;

use idx_decoder::DecodeError;
use idx_wire::WireError;

use crate::key::Kind;

/// Errors from a [`DatasetCache`](crate::DatasetCache).
///
/// ```text
/// ┌──────────────────┬────────────────────────────────────────────────┐
/// │ Variant          │ Cause                                          │
/// ├──────────────────┼────────────────────────────────────────────────┤
/// │ DuplicateKey     │ add-only store already holds this key          │
/// │ StoreUnavailable │ the backing database could not be opened       │
/// │ KindMismatch     │ payload kind differs from the key's kind       │
/// │ Corrupt          │ stored bytes fail digest or format checks      │
/// │ TooLarge         │ payload length does not fit a store row        │
/// │ Sqlite           │ any other database failure                     │
/// │ Wire             │ payload could not be serialised                │
/// └──────────────────┴────────────────────────────────────────────────┘
/// ```
///
/// `DuplicateKey` is the one error callers are expected to tolerate: the
/// value they tried to store is still valid, only the write was dropped.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("dataset {key} is already cached")]
    DuplicateKey { key: String },

    #[error("cannot open dataset store at {}: {source}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("payload of kind {found:?} cannot be stored under {key}")]
    KindMismatch { key: String, found: Kind },

    #[error("cached dataset {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: PayloadError,
    },

    #[error("dataset {key} of {size} bytes is too large for the store")]
    TooLarge { key: String, size: usize },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl CacheError {
    /// True for the add-only rejection that callers may ignore.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

/// Why a stored entry could not be turned back into a [`Payload`](crate::Payload).
///
/// ```text
///   PayloadError
///   ├── Decompress      ← body is not a valid zstd frame
///   ├── TooLarge        ← decompressed output would pass the limit
///   ├── LengthMismatch  ← raw length differs from the recorded one
///   ├── DigestMismatch  ← BLAKE3 of the raw bytes differs
///   ├── UnknownKind     ← kind column is neither images nor labels
///   ├── DigestLength    ← digest column is not 32 bytes
///   ├── NegativeLength  ← raw_len column is negative
///   └── Decode          ← raw bytes are not a well-formed IDX file
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("zstd decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("decompressed size exceeds limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("length {actual} does not match recorded {recorded}")]
    LengthMismatch { actual: usize, recorded: usize },

    #[error("BLAKE3 digest mismatch")]
    DigestMismatch,

    #[error("unknown kind {0:?}")]
    UnknownKind(String),

    #[error("digest is {0} bytes, expected 32")]
    DigestLength(usize),

    #[error("negative length {0}")]
    NegativeLength(i64),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
