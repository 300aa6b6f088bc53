//! End-to-end loads: files on disk, decoded through the loader, persisted
//! in a SQLite cache, and served from that cache on the next run.

use std::sync::Arc;

use idx_cache::{DatasetCache, DatasetKey, Kind, Split, SqliteDatasetCache};
use idx_loader::{DatasetLoader, FileTransport, LoadError, LoadStats, LoaderConfig};
use idx_tests::Fixture;
use idx_wire::{HeaderPolicy, ImageHeader, LabelHeader};

fn config_for(fixture: &Fixture) -> LoaderConfig {
    LoaderConfig {
        train_images: ImageHeader::new(fixture.count(), fixture.rows, fixture.cols),
        train_labels: LabelHeader::new(fixture.count()),
        ..LoaderConfig::default()
    }
}

fn loader(
    dir: &std::path::Path,
    cache: Arc<SqliteDatasetCache>,
    config: LoaderConfig,
) -> DatasetLoader<FileTransport, SqliteDatasetCache> {
    DatasetLoader::new(FileTransport::new(dir).with_chunk_size(5), cache, config)
}

#[tokio::test]
async fn load_persist_and_reload_from_sqlite() {
    let data = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    let db = store.path().join("MNIST.sqlite3");
    let fixture = Fixture::new(25, 4, 3);
    fixture.write_train_files(data.path()).unwrap();

    let first = {
        let cache = Arc::new(SqliteDatasetCache::open(&db).unwrap());
        let loader = loader(data.path(), cache, config_for(&fixture));
        let mnist = loader.load_mnist().await.unwrap();
        assert_eq!(
            loader.stats(),
            LoadStats { fetches: 2, cache_hits: 0, stores: 2, duplicate_puts: 0 }
        );
        mnist
    };

    assert_eq!(first.train.len(), 25);
    assert_eq!(first.train.labels, fixture.labels);
    for (i, (pixels, label)) in first.train.pairs().enumerate() {
        assert_eq!(pixels, fixture.records[i].as_slice());
        assert_eq!(label, fixture.labels[i]);
    }
    assert!(first.test.is_empty());

    // The source files are gone; a fresh process must be served from disk.
    drop(data);
    let cache = Arc::new(SqliteDatasetCache::open(&db).unwrap());
    let missing = tempfile::tempdir().unwrap();
    let loader = loader(missing.path(), cache, config_for(&fixture));
    let second = loader.load_mnist().await.unwrap();

    assert_eq!(second, first);
    assert_eq!(
        loader.stats(),
        LoadStats { fetches: 0, cache_hits: 2, stores: 0, duplicate_puts: 0 }
    );
}

#[tokio::test]
async fn cache_holds_canonical_entries_under_split_kind_keys() {
    let data = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(3, 2, 2);
    fixture.write_train_files(data.path()).unwrap();

    let cache = Arc::new(SqliteDatasetCache::open_in_memory().unwrap());
    let loader = loader(data.path(), Arc::clone(&cache), config_for(&fixture));
    loader.load_mnist().await.unwrap();

    assert_eq!(cache.keys().unwrap(), vec!["train_images", "train_labels"]);
    assert!(cache.contains(DatasetKey::new(Split::Train, Kind::Labels)).unwrap());
    assert!(!cache.contains(DatasetKey::new(Split::Test, Kind::Images)).unwrap());

    let images = cache.get_images(Split::Train).unwrap().unwrap();
    assert_eq!(images.to_idx_bytes().unwrap(), fixture.image_bytes);
    let labels = cache.get_labels(Split::Train).unwrap().unwrap();
    assert_eq!(labels, fixture.labels);
}

#[tokio::test]
async fn second_loader_on_shared_cache_does_not_refetch() {
    let data = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(8, 2, 2);
    fixture.write_train_files(data.path()).unwrap();
    let cache = Arc::new(SqliteDatasetCache::open_in_memory().unwrap());

    let a = loader(data.path(), Arc::clone(&cache), config_for(&fixture));
    let b = loader(data.path(), Arc::clone(&cache), config_for(&fixture));
    let from_a = a.load_images(Split::Train).await.unwrap();
    let from_b = b.load_images(Split::Train).await.unwrap();

    assert_eq!(from_a, from_b);
    assert_eq!(a.stats().fetches, 1);
    assert_eq!(b.stats().fetches, 0);
    assert_eq!(b.stats().cache_hits, 1);
}

#[tokio::test]
async fn wrong_shape_is_a_format_error_and_nothing_is_cached() {
    let data = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(4, 2, 2);
    fixture.write_train_files(data.path()).unwrap();
    let cache = Arc::new(SqliteDatasetCache::open_in_memory().unwrap());

    // Default config expects 60000x28x28.
    let loader = loader(data.path(), Arc::clone(&cache), LoaderConfig::default());
    let err = loader.load_images(Split::Train).await.unwrap_err();
    assert!(matches!(err, LoadError::Format { .. }), "{err:?}");
    assert!(cache.keys().unwrap().is_empty());
}

#[tokio::test]
async fn lenient_policy_accepts_any_nonzero_shape() {
    let data = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(4, 3, 2);
    fixture.write_train_files(data.path()).unwrap();
    let cache = Arc::new(SqliteDatasetCache::open_in_memory().unwrap());

    let config = LoaderConfig {
        header_policy: HeaderPolicy::NonZero,
        ..LoaderConfig::default()
    };
    let loader = loader(data.path(), cache, config);
    let images = loader.load_images(Split::Train).await.unwrap();
    assert_eq!((images.len(), images.rows(), images.cols()), (4, 3, 2));
}

#[tokio::test]
async fn truncated_file_on_disk_fails_the_load() {
    let data = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(4, 2, 2);
    fixture.write_train_files(data.path()).unwrap();
    let path = data.path().join("train-images.idx3-ubyte");
    std::fs::write(&path, &fixture.image_bytes[..fixture.image_bytes.len() - 2]).unwrap();

    let cache = Arc::new(SqliteDatasetCache::open_in_memory().unwrap());
    let loader = loader(data.path(), cache, config_for(&fixture));
    let err = loader.load_mnist().await.unwrap_err();
    assert!(matches!(err, LoadError::Format { .. }), "{err:?}");
}
