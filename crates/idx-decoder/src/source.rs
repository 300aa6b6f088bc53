use std::io;

use bytes::Bytes;
use idx_wire::{HeaderPolicy, ImageHeader};
use log::info;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::DecodeError;
use crate::image_stream::ImageStreamDecoder;
use crate::records::ImageRecords;

/// Default read size for [`ReaderChunks`].
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// An ordered source of byte chunks with arbitrary boundaries.
///
/// Transports (files, HTTP bodies, test fixtures) implement this so the
/// decoder never has to know where its bytes come from. `None` marks the
/// end of the stream.
#[allow(async_fn_in_trait)]
pub trait ChunkSource {
    async fn next_chunk(&mut self) -> Option<io::Result<Bytes>>;
}

/// Chunks read from any `AsyncRead`, at most `chunk_size` bytes each.
///
/// Short reads are passed through as short chunks; the decoder does not
/// care.
pub struct ReaderChunks<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: AsyncRead + Unpin> ReaderChunks<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self { reader, chunk_size }
    }
}

impl<R: AsyncRead + Unpin> ChunkSource for ReaderChunks<R> {
    async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        let mut buf = vec![0u8; self.chunk_size];
        match self.reader.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some(Ok(Bytes::from(buf)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Chunks taken from an in-memory iterator.
pub struct ChunkIter<I>(pub I);

impl<I: Iterator<Item = Bytes>> ChunkSource for ChunkIter<I> {
    async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        self.0.next().map(Ok)
    }
}

/// Drive an [`ImageStreamDecoder`] over every chunk of `source`.
///
/// # Errors
///
/// [`DecodeError::Io`] if the source fails, otherwise any decode error.
pub async fn decode_image_stream<S: ChunkSource>(
    source: &mut S,
    expected: &ImageHeader,
    policy: HeaderPolicy,
) -> Result<ImageRecords, DecodeError> {
    let mut decoder = ImageStreamDecoder::new(*expected, policy);
    let mut chunks = 0usize;
    while let Some(chunk) = source.next_chunk().await {
        decoder.push(&chunk?)?;
        chunks += 1;
    }
    let records = decoder.finish()?;
    info!("decoded {} image records from {chunks} chunks", records.len());
    Ok(records)
}

/// Concatenate every chunk of `source`.
///
/// # Errors
///
/// The first error the source returns.
pub async fn collect_chunks<S: ChunkSource>(source: &mut S) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = source.next_chunk().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use idx_wire::encode_images;

    #[tokio::test]
    async fn reader_chunks_decode_like_one_buffer() {
        let records: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 4]).collect();
        let bytes = encode_images(2, 2, &records).unwrap();
        let mut source = ReaderChunks::with_chunk_size(std::io::Cursor::new(bytes.clone()), 3);

        let expected = ImageHeader::new(5, 2, 2);
        let streamed = decode_image_stream(&mut source, &expected, HeaderPolicy::Strict)
            .await
            .unwrap();
        let whole = crate::decode_images(&bytes, &expected, HeaderPolicy::Strict).unwrap();
        assert_eq!(streamed, whole);
    }

    #[tokio::test]
    async fn chunk_iter_scenario() {
        let bytes = encode_images(2, 2, &[[1u8, 2, 3, 4], [5, 6, 7, 8]]).unwrap();
        let chunks = vec![
            Bytes::copy_from_slice(&bytes[..19]),
            Bytes::copy_from_slice(&bytes[19..22]),
            Bytes::copy_from_slice(&bytes[22..]),
        ];
        let mut source = ChunkIter(chunks.into_iter());
        let records = decode_image_stream(&mut source, &ImageHeader::new(2, 2, 2), HeaderPolicy::Strict)
            .await
            .unwrap();
        assert_eq!(records.get(0), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(records.get(1), Some(&[5u8, 6, 7, 8][..]));
    }

    struct FailingSource(bool);

    impl ChunkSource for FailingSource {
        async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
            if self.0 {
                return None;
            }
            self.0 = true;
            Some(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
        }
    }

    #[tokio::test]
    async fn source_errors_surface_as_io() {
        let result =
            decode_image_stream(&mut FailingSource(false), &ImageHeader::new(1, 2, 2), HeaderPolicy::Strict)
                .await;
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }

    #[tokio::test]
    async fn collect_concatenates() {
        let chunks = vec![Bytes::from_static(b"ab"), Bytes::from_static(b""), Bytes::from_static(b"c")];
        let all = collect_chunks(&mut ChunkIter(chunks.into_iter())).await.unwrap();
        assert_eq!(all, b"abc");
    }
}
