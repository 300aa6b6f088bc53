use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use idx_cache::{CacheError, DatasetCache, DatasetKey, Kind, Payload, Split};
use idx_decoder::{collect_chunks, decode_image_stream, decode_labels, ImageRecords};
use idx_wire::{ImageHeader, LabelHeader};
use log::{info, warn};

use crate::config::LoaderConfig;
use crate::error::{LoadError, TransportError};
use crate::mnist::{Mnist, SplitData};
use crate::transport::{resource_name, Transport};

/// Counters describing what a loader has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Resources opened on the transport.
    pub fetches: usize,
    /// Loads answered by the cache.
    pub cache_hits: usize,
    /// Payloads written to the cache.
    pub stores: usize,
    /// Writes rejected as duplicates and ignored.
    pub duplicate_puts: usize,
}

#[derive(Default)]
struct Counters {
    fetches: AtomicUsize,
    cache_hits: AtomicUsize,
    stores: AtomicUsize,
    duplicate_puts: AtomicUsize,
}

/// Cache-first loader for IDX datasets.
///
/// ```text
///   load(key)
///     │
///     ├─ cache.get(key) ── Some ──▶ return            (no fetch, no decode)
///     │
///     └─ None ─▶ transport.open(resource)
///                 └─▶ decode (streamed images / whole labels)
///                      └─▶ cache.put(key)  ── DuplicateKey ─▶ warn, keep value
///                           └─▶ return
/// ```
///
/// Store calls run on the blocking pool, so a slow disk never stalls the
/// runtime thread that is decoding the other dataset. Each load is
/// independent; two loads of the same key may both miss and both fetch,
/// in which case the second `put` loses with `DuplicateKey` and is
/// ignored.
pub struct DatasetLoader<T, C> {
    transport: T,
    cache: Arc<C>,
    config: LoaderConfig,
    counters: Counters,
}

impl<T, C> DatasetLoader<T, C>
where
    T: Transport,
    C: DatasetCache + 'static,
{
    pub fn new(transport: T, cache: Arc<C>, config: LoaderConfig) -> Self {
        Self {
            transport,
            cache,
            config,
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    pub fn stats(&self) -> LoadStats {
        LoadStats {
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            stores: self.counters.stores.load(Ordering::Relaxed),
            duplicate_puts: self.counters.duplicate_puts.load(Ordering::Relaxed),
        }
    }

    /// Load the image records of `split`.
    ///
    /// # Errors
    ///
    /// See [`LoadError`].
    pub async fn load_images(&self, split: Split) -> Result<ImageRecords, LoadError> {
        let key = DatasetKey::new(split, Kind::Images);
        match self.load_payload(key).await? {
            Payload::Images(records) => Ok(records),
            Payload::Labels(_) => Err(kind_mismatch(key, Kind::Labels)),
        }
    }

    /// Load the label sequence of `split`.
    ///
    /// # Errors
    ///
    /// See [`LoadError`].
    pub async fn load_labels(&self, split: Split) -> Result<Vec<u8>, LoadError> {
        let key = DatasetKey::new(split, Kind::Labels);
        match self.load_payload(key).await? {
            Payload::Labels(labels) => Ok(labels),
            Payload::Images(_) => Err(kind_mismatch(key, Kind::Images)),
        }
    }

    /// Load one dataset, cache first.
    ///
    /// # Errors
    ///
    /// - [`LoadError::Cache`] if the store fails (a duplicate-key rejection
    ///   on write is not an error).
    /// - [`LoadError::Transport`] / [`LoadError::Timeout`] if the bytes
    ///   cannot be fetched.
    /// - [`LoadError::Format`] if they do not decode.
    pub async fn load_payload(&self, key: DatasetKey) -> Result<Payload, LoadError> {
        if let Some(payload) = self.cache_get(key).await? {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            info!("found cached {key} ({} records)", payload.len());
            return Ok(payload);
        }

        info!("{key} not cached, fetching {}", resource_name(key));
        let payload = match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_and_decode(key))
                .await
                .map_err(|_| LoadError::Timeout {
                    key: key.to_string(),
                    after: limit,
                })??,
            None => self.fetch_and_decode(key).await?,
        };

        self.cache_put(key, payload).await
    }

    /// Load the train split and combine it with the empty test placeholder.
    ///
    /// Labels and images are fetched concurrently.
    ///
    /// # Errors
    ///
    /// Any error from either load, or [`LoadError::Misaligned`] when
    /// `verify_alignment` is set and the counts differ.
    pub async fn load_mnist(&self) -> Result<Mnist, LoadError> {
        let (labels, images) =
            tokio::try_join!(self.load_labels(Split::Train), self.load_images(Split::Train))?;

        if self.config.verify_alignment && labels.len() != images.len() {
            return Err(LoadError::Misaligned {
                labels: labels.len(),
                images: images.len(),
            });
        }

        let rows = images.rows();
        let cols = images.cols();
        Ok(Mnist {
            train: SplitData { images, labels },
            test: SplitData::empty(rows, cols),
        })
    }

    fn expected_images(&self, split: Split) -> ImageHeader {
        match split {
            Split::Train => self.config.train_images,
            Split::Test => self.config.test_images,
        }
    }

    fn expected_labels(&self, split: Split) -> LabelHeader {
        match split {
            Split::Train => self.config.train_labels,
            Split::Test => self.config.test_labels,
        }
    }

    async fn fetch_and_decode(&self, key: DatasetKey) -> Result<Payload, LoadError> {
        let resource = resource_name(key);
        let mut source = self.transport.open(resource).await?;
        self.counters.fetches.fetch_add(1, Ordering::Relaxed);
        let policy = self.config.header_policy;

        match key.kind {
            Kind::Images => {
                let expected = self.expected_images(key.split);
                decode_image_stream(&mut source, &expected, policy)
                    .await
                    .map(Payload::Images)
                    .map_err(|e| LoadError::from_decode(resource, e))
            }
            Kind::Labels => {
                let buf = collect_chunks(&mut source)
                    .await
                    .map_err(|source| TransportError::Io {
                        resource: resource.to_string(),
                        source,
                    })?;
                decode_labels(&buf, &self.expected_labels(key.split), policy)
                    .map(Payload::Labels)
                    .map_err(|e| LoadError::from_decode(resource, e))
            }
        }
    }

    async fn cache_get(&self, key: DatasetKey) -> Result<Option<Payload>, LoadError> {
        let cache = Arc::clone(&self.cache);
        Ok(tokio::task::spawn_blocking(move || cache.get(key)).await??)
    }

    /// Store a freshly decoded payload and hand it back.
    async fn cache_put(&self, key: DatasetKey, payload: Payload) -> Result<Payload, LoadError> {
        let cache = Arc::clone(&self.cache);
        let (payload, stored) = tokio::task::spawn_blocking(move || {
            let stored = cache.put(key, &payload);
            (payload, stored)
        })
        .await?;

        match stored {
            Ok(()) => {
                self.counters.stores.fetch_add(1, Ordering::Relaxed);
                Ok(payload)
            }
            Err(e) if e.is_duplicate_key() => {
                self.counters.duplicate_puts.fetch_add(1, Ordering::Relaxed);
                warn!("{e}; returning the freshly decoded value");
                Ok(payload)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn kind_mismatch(key: DatasetKey, found: Kind) -> LoadError {
    LoadError::Cache(CacheError::KindMismatch {
        key: key.to_string(),
        found,
    })
}
