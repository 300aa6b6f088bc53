use std::io::{Cursor, Read};

use crate::error::PayloadError;

/// Upper bound on a decompressed cache entry.
///
/// The MNIST train images are ~47 MiB; anything past this is not a
/// dataset this cache wrote.
pub const MAX_PAYLOAD_SIZE: usize = 1 << 30;

const COMPRESSION_LEVEL: i32 = 3;

/// Compress with zstd, or `None` if that would not save space.
pub fn compress(data: &[u8]) -> Option<Vec<u8>> {
    let compressed = zstd::encode_all(Cursor::new(data), COMPRESSION_LEVEL).ok()?;
    if compressed.len() < data.len() {
        Some(compressed)
    } else {
        None
    }
}

/// Decompress a zstd frame, refusing output larger than `max_size`.
///
/// The decoder is read through a `take(max_size + 1)` window, so at most
/// one byte past the limit is ever produced before the frame is rejected.
///
/// # Errors
///
/// - [`PayloadError::Decompress`] if zstd cannot decode the input.
/// - [`PayloadError::TooLarge`] if the output exceeds `max_size`.
pub fn decompress(data: &[u8], max_size: usize) -> Result<Vec<u8>, PayloadError> {
    let decoder = zstd::Decoder::new(data).map_err(PayloadError::Decompress)?;
    let mut decompressed = Vec::new();
    decoder
        .take(max_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(PayloadError::Decompress)?;
    if decompressed.len() > max_size {
        return Err(PayloadError::TooLarge { limit: max_size });
    }
    Ok(decompressed)
}
