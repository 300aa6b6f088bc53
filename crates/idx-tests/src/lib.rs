//! Shared fixtures for the integration tests and benches.
//!
//! Synthetic datasets are deterministic: record `i` is filled from a
//! small linear congruential sequence seeded with `i`, and its label is
//! `i % 10`. That keeps every record distinct, which is what catches a
//! record landing at the wrong index.

use bytes::Bytes;
use idx_wire::{encode_images, encode_labels};

/// An image file and its matching label file.
pub struct Fixture {
    pub rows: u32,
    pub cols: u32,
    pub records: Vec<Vec<u8>>,
    pub labels: Vec<u8>,
    pub image_bytes: Vec<u8>,
    pub label_bytes: Vec<u8>,
}

impl Fixture {
    /// # Panics
    ///
    /// Panics if `count` does not fit in the 32-bit count word.
    #[must_use]
    pub fn new(count: usize, rows: u32, cols: u32) -> Self {
        let record_size = rows as usize * cols as usize;
        let records: Vec<Vec<u8>> = (0..count).map(|i| pixels(i, record_size)).collect();
        #[allow(clippy::cast_possible_truncation)]
        let labels: Vec<u8> = (0..count).map(|i| (i % 10) as u8).collect();
        let image_bytes = encode_images(rows, cols, &records).expect("fixture records are well-sized");
        let label_bytes = encode_labels(&labels).expect("fixture count fits in u32");
        Self {
            rows,
            cols,
            records,
            labels,
            image_bytes,
            label_bytes,
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn count(&self) -> u32 {
        self.records.len() as u32
    }

    /// Write both files under their MNIST train names.
    ///
    /// # Errors
    ///
    /// Any I/O error from writing the files.
    pub fn write_train_files(&self, dir: &std::path::Path) -> std::io::Result<()> {
        std::fs::write(dir.join("train-images.idx3-ubyte"), &self.image_bytes)?;
        std::fs::write(dir.join("train-labels.idx1-ubyte"), &self.label_bytes)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn pixels(seed: usize, len: usize) -> Vec<u8> {
    let mut state = (seed as u32).wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

/// Split `bytes` at the given cut points (sorted, in range).
#[must_use]
pub fn split_at_points(bytes: &[u8], cuts: &[usize]) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for &cut in cuts {
        chunks.push(Bytes::copy_from_slice(&bytes[start..cut]));
        start = cut;
    }
    chunks.push(Bytes::copy_from_slice(&bytes[start..]));
    chunks
}

/// Split `bytes` into chunks of `size` (the last may be shorter).
#[must_use]
pub fn split_every(bytes: &[u8], size: usize) -> Vec<Bytes> {
    bytes.chunks(size).map(Bytes::copy_from_slice).collect()
}
