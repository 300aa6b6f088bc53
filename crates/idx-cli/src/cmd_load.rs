/// Implementation of `idx load`.
///
/// Builds a [`LoaderConfig`] from the flags, picks a file or HTTP
/// transport, and loads the train split through the SQLite store. The
/// first run fetches and decodes; later runs are served from the store.
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use idx_cache::SqliteDatasetCache;
use idx_loader::{DatasetLoader, FileTransport, HttpTransport, LoadStats, LoaderConfig, Mnist, Transport};
use idx_wire::HeaderPolicy;
use log::info;
use serde::Serialize;

use crate::LoadArgs;

#[derive(Serialize)]
struct LoadSummary {
    images: usize,
    labels: usize,
    rows: u32,
    cols: u32,
    /// Records per class, indexed by label value 0..=9.
    classes: Vec<usize>,
    fetches: usize,
    cache_hits: usize,
    stored: usize,
    elapsed_ms: u128,
}

pub async fn run(args: &LoadArgs) -> Result<()> {
    let config = LoaderConfig {
        fetch_timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
        header_policy: if args.lenient {
            HeaderPolicy::NonZero
        } else {
            HeaderPolicy::Strict
        },
        chunk_size: args.chunk_size,
        ..LoaderConfig::default()
    };

    let cache = Arc::new(
        SqliteDatasetCache::open(&args.store.cache)
            .with_context(|| format!("cannot open dataset store {}", args.store.cache.display()))?,
    );

    match &args.base_url {
        Some(url) => {
            info!("fetching datasets from {url}");
            load_with(HttpTransport::new(url.as_str()), cache, config, args.json).await
        }
        None => {
            info!("reading datasets from {}", args.data_dir.display());
            let transport = FileTransport::new(&args.data_dir).with_chunk_size(config.chunk_size);
            load_with(transport, cache, config, args.json).await
        }
    }
}

async fn load_with<T: Transport>(
    transport: T,
    cache: Arc<SqliteDatasetCache>,
    config: LoaderConfig,
    json: bool,
) -> Result<()> {
    let started = Instant::now();
    let loader = DatasetLoader::new(transport, cache, config);
    let mnist = loader.load_mnist().await.context("failed to load the train split")?;
    let summary = summarize(&mnist, loader.stats(), started.elapsed().as_millis());

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "train: {} images of {}x{}, {} labels",
            summary.images, summary.rows, summary.cols, summary.labels
        );
        println!("test:  not loaded");
        println!(
            "fetched {} dataset{}, {} from cache, {} stored ({} ms)",
            summary.fetches,
            if summary.fetches == 1 { "" } else { "s" },
            summary.cache_hits,
            summary.stored,
            summary.elapsed_ms
        );
    }
    Ok(())
}

fn summarize(mnist: &Mnist, stats: LoadStats, elapsed_ms: u128) -> LoadSummary {
    let mut classes = vec![0usize; 10];
    for (_, label) in mnist.train.pairs() {
        if let Some(slot) = classes.get_mut(usize::from(label)) {
            *slot += 1;
        }
    }
    LoadSummary {
        images: mnist.train.images.len(),
        labels: mnist.train.labels.len(),
        rows: mnist.train.images.rows(),
        cols: mnist.train.images.cols(),
        classes,
        fetches: stats.fetches,
        cache_hits: stats.cache_hits,
        stored: stats.stores,
        elapsed_ms,
    }
}
