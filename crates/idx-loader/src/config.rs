use std::time::Duration;

use idx_decoder::DEFAULT_CHUNK_SIZE;
use idx_wire::{HeaderPolicy, ImageHeader, LabelHeader};

/// Record count of the MNIST test files.
pub const MNIST_TEST_COUNT: u32 = 10_000;

/// Configuration for the [`DatasetLoader`](crate::DatasetLoader).
///
/// ```text
/// ┌──────────────────┬─────────────────────────────────────────────────┐
/// │ Field            │ Purpose                                         │
/// ├──────────────────┼─────────────────────────────────────────────────┤
/// │ fetch_timeout    │ Limit on one fetch-and-decode (None = no limit) │
/// │ header_policy    │ Strict equality or lenient non-zero checks      │
/// │ train_images     │ Expected shape of the train image file          │
/// │ train_labels     │ Expected count of the train label file          │
/// │ test_images      │ Expected shape of the test image file           │
/// │ test_labels      │ Expected count of the test label file           │
/// │ chunk_size       │ Read size for file-backed transports            │
/// │ verify_alignment │ Require label count == image count              │
/// └──────────────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Upper bound on fetching and decoding one dataset. A stalled
    /// transport fails with `LoadError::Timeout` instead of hanging.
    pub fetch_timeout: Option<Duration>,

    pub header_policy: HeaderPolicy,

    pub train_images: ImageHeader,
    pub train_labels: LabelHeader,
    pub test_images: ImageHeader,
    pub test_labels: LabelHeader,

    pub chunk_size: usize,

    /// When set, `load_mnist` rejects a split whose label and image
    /// counts differ.
    pub verify_alignment: bool,
}

impl Default for LoaderConfig {
    /// MNIST shapes, strict headers, two-minute fetch limit.
    fn default() -> Self {
        Self {
            fetch_timeout: Some(Duration::from_secs(120)),
            header_policy: HeaderPolicy::Strict,
            train_images: ImageHeader::MNIST_TRAIN,
            train_labels: LabelHeader::MNIST_TRAIN,
            test_images: ImageHeader::new(MNIST_TEST_COUNT, 28, 28),
            test_labels: LabelHeader::new(MNIST_TEST_COUNT),
            chunk_size: DEFAULT_CHUNK_SIZE,
            verify_alignment: true,
        }
    }
}
