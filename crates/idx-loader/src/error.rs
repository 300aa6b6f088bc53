use std::time::Duration;

use idx_cache::CacheError;
use idx_decoder::DecodeError;

/// Failures fetching raw bytes for a named resource.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("resource {resource} not found")]
    NotFound { resource: String },

    #[error("fetching {resource} returned HTTP {status}")]
    Status { resource: String, status: u16 },

    #[error("fetching {resource} failed: {source}")]
    Http {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading {resource} failed: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from a dataset load.
///
/// ```text
///   LoadError
///   ├── Format     ← bytes arrived but are not the expected dataset
///   ├── Transport  ← bytes did not arrive
///   ├── Timeout    ← bytes stopped arriving
///   ├── Misaligned ← labels and images disagree on the record count
///   ├── Cache      ← store unavailable or failing (never DuplicateKey)
///   └── Task       ← a blocking store task panicked
/// ```
///
/// None of these are retried here.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{resource}: {source}")]
    Format {
        resource: String,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("loading {key} did not finish within {after:?}")]
    Timeout { key: String, after: Duration },

    #[error("{labels} labels do not line up with {images} images")]
    Misaligned { labels: usize, images: usize },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("dataset store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl LoadError {
    /// Classify a decoder failure: I/O from the chunk source is a
    /// transport problem, everything else is a format problem.
    pub(crate) fn from_decode(resource: &str, error: DecodeError) -> Self {
        match error {
            DecodeError::Io(source) => Self::Transport(TransportError::Io {
                resource: resource.to_string(),
                source,
            }),
            source => Self::Format {
                resource: resource.to_string(),
                source,
            },
        }
    }
}
