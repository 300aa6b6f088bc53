use std::mem;

use idx_wire::{check_word, HeaderPolicy, ImageHeader, IMAGE_HEADER_SIZE, IMAGE_MAGIC, WORD_SIZE};
use log::debug;

use crate::error::DecodeError;
use crate::records::ImageRecords;

/// Incremental decoder for an IDX image file delivered in chunks.
///
/// Chunks may end anywhere: inside the header, inside a record, or
/// exactly on a record boundary. The decoder owns all state that has to
/// survive between chunks, so the caller only needs to feed chunks in
/// order and call [`finish`](Self::finish) once the transport is done.
///
/// ```text
///              ┌──── chunk 1 ────┐┌── chunk 2 ──┐┌ chunk 3 ┐
///   stream:    [ header ][ r0 ][ r1 ... ][ r1 ][ r2 ][ r3 ... ]
///                                 │         ▲
///                                 └─carry───┘
/// ```
///
/// `carry` is the number of bytes already written into the record in
/// progress. It is always in `0..record_size`; the moment it would reach
/// `record_size` the record is complete and moves into the collection.
/// A partial record can span any number of chunks, including chunks of
/// a single byte.
///
/// Records complete strictly in index order and are never rewritten.
/// Intermediate state is not exposed as a collection: the only way to get
/// the records out is `finish`, which fails unless every declared record
/// arrived.
///
/// # Example
///
/// ```rust
/// use idx_decoder::ImageStreamDecoder;
/// use idx_wire::{encode_images, HeaderPolicy, ImageHeader};
///
/// let bytes = encode_images(2, 2, &[[1u8, 2, 3, 4], [5, 6, 7, 8]]).unwrap();
/// let mut decoder = ImageStreamDecoder::new(ImageHeader::new(2, 2, 2), HeaderPolicy::Strict);
/// for chunk in bytes.chunks(3) {
///     decoder.push(chunk).unwrap();
/// }
/// let records = decoder.finish().unwrap();
/// assert_eq!(records.get(1), Some(&[5u8, 6, 7, 8][..]));
/// ```
#[derive(Debug)]
pub struct ImageStreamDecoder {
    expected: ImageHeader,
    policy: HeaderPolicy,
    state: StreamState,
    header_buf: [u8; IMAGE_HEADER_SIZE],
    header_len: usize,
    header: Option<ImageHeader>,
    records: Vec<Box<[u8]>>,
    record_size: usize,
    /// Bytes of the record in progress. Grows as chunks arrive, so a
    /// declared shape never allocates more than the stream delivers.
    current: Vec<u8>,
}

/// Upper bound on record slots reserved before any record data arrives.
const PREALLOC_RECORDS: usize = 1 << 16;

/// ```text
///   ReadHeader → ReadRecords → Done
///        └───────────┴────────→ Failed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    ReadHeader,
    ReadRecords,
    Done,
    Failed,
}

impl ImageStreamDecoder {
    /// Create a decoder that validates the header against `expected`.
    #[must_use]
    pub fn new(expected: ImageHeader, policy: HeaderPolicy) -> Self {
        Self {
            expected,
            policy,
            state: StreamState::ReadHeader,
            header_buf: [0u8; IMAGE_HEADER_SIZE],
            header_len: 0,
            header: None,
            records: Vec::new(),
            record_size: 0,
            current: Vec::new(),
        }
    }

    /// Feed the next chunk of the stream.
    ///
    /// Empty chunks are accepted and change nothing.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidHeader`] as soon as the magic word is
    ///   complete and wrong, or once the whole header is complete and
    ///   fails validation. No record bytes are interpreted before that.
    /// - [`DecodeError::EmptyRecord`] if the header declares zero-sized records.
    /// - [`DecodeError::TrailingData`] if the chunk runs past the last
    ///   declared record.
    /// - [`DecodeError::Poisoned`] if an earlier chunk already failed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        let result = self.push_inner(chunk);
        if result.is_err() {
            self.state = StreamState::Failed;
        }
        result
    }

    fn push_inner(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        let mut rest = chunk;

        if self.state == StreamState::Failed {
            return Err(DecodeError::Poisoned);
        }

        if self.state == StreamState::ReadHeader {
            let take = (IMAGE_HEADER_SIZE - self.header_len).min(rest.len());
            self.header_buf[self.header_len..self.header_len + take]
                .copy_from_slice(&rest[..take]);
            self.header_len += take;
            rest = &rest[take..];

            // The magic word is judged as soon as it is complete, so a
            // foreign file fails on its first chunk, not at end of stream.
            if self.header_len >= WORD_SIZE && self.header_len - take < WORD_SIZE {
                check_word(&self.header_buf, 0, IMAGE_MAGIC, self.policy)
                    .map_err(DecodeError::InvalidHeader)?;
            }
            if self.header_len < IMAGE_HEADER_SIZE {
                return Ok(());
            }
            self.start_records()?;
        }

        let before = self.records.len();
        while !rest.is_empty() {
            if self.state == StreamState::Done {
                return Err(DecodeError::TrailingData {
                    extra_bytes: rest.len(),
                });
            }
            rest = self.fill(rest);
        }

        debug!(
            "decoded {} records from {}-byte chunk, {} of {} complete, carry {}",
            self.records.len() - before,
            chunk.len(),
            self.records.len(),
            self.declared_count(),
            self.current.len()
        );
        Ok(())
    }

    /// Validate the buffered header and size the record storage.
    fn start_records(&mut self) -> Result<(), DecodeError> {
        let header = ImageHeader::read_from(&self.header_buf, &self.expected, self.policy)
            .map_err(DecodeError::InvalidHeader)?;
        let record_size = header.record_size();
        if record_size == 0 {
            return Err(DecodeError::EmptyRecord {
                rows: header.rows,
                cols: header.cols,
            });
        }

        self.records = Vec::with_capacity((header.count as usize).min(PREALLOC_RECORDS));
        self.record_size = record_size;
        self.header = Some(header);
        self.state = if header.count == 0 {
            StreamState::Done
        } else {
            StreamState::ReadRecords
        };
        Ok(())
    }

    /// Consume bytes for the current record; return what is left.
    fn fill<'a>(&mut self, rest: &'a [u8]) -> &'a [u8] {
        let record_size = self.record_size;

        // Whole record available and nothing carried over: copy it directly.
        if self.current.is_empty() && rest.len() >= record_size {
            self.complete(rest[..record_size].into());
            return &rest[record_size..];
        }

        let take = (record_size - self.current.len()).min(rest.len());
        self.current.extend_from_slice(&rest[..take]);

        if self.current.len() == record_size {
            let record = mem::take(&mut self.current).into_boxed_slice();
            self.complete(record);
        }
        &rest[take..]
    }

    fn complete(&mut self, record: Box<[u8]>) {
        self.records.push(record);
        if self.records.len() == self.declared_count() {
            self.state = StreamState::Done;
        }
    }

    fn declared_count(&self) -> usize {
        self.header.map_or(0, |h| h.count as usize)
    }

    /// End of stream: hand over the records if every one arrived.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::HeaderTruncated`] if the header never completed.
    /// - [`DecodeError::Truncated`] if records are missing.
    /// - [`DecodeError::Poisoned`] if a chunk failed earlier.
    pub fn finish(self) -> Result<ImageRecords, DecodeError> {
        match (self.state, self.header) {
            (StreamState::Done, Some(header)) => Ok(ImageRecords::from_parts(
                header.rows,
                header.cols,
                self.records,
            )),
            (StreamState::ReadHeader, _) => Err(DecodeError::HeaderTruncated {
                received: self.header_len,
            }),
            (StreamState::ReadRecords, _) => Err(DecodeError::Truncated {
                expected: self.declared_count(),
                completed: self.records.len(),
                carry: self.current.len(),
            }),
            _ => Err(DecodeError::Poisoned),
        }
    }

    /// Records fully decoded so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.records.len()
    }

    /// Bytes already written into the record in progress.
    #[must_use]
    pub fn carry(&self) -> usize {
        self.current.len()
    }

    #[must_use]
    pub fn is_header_consumed(&self) -> bool {
        self.header.is_some()
    }

    /// The validated header, once it has been read.
    #[must_use]
    pub fn header(&self) -> Option<&ImageHeader> {
        self.header.as_ref()
    }

    /// True once every declared record has been decoded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == StreamState::Done
    }
}

/// Decode an image file that is already fully in memory.
///
/// # Errors
///
/// Any [`DecodeError`] from [`ImageStreamDecoder::push`] or
/// [`ImageStreamDecoder::finish`].
pub fn decode_images(
    buf: &[u8],
    expected: &ImageHeader,
    policy: HeaderPolicy,
) -> Result<ImageRecords, DecodeError> {
    let mut decoder = ImageStreamDecoder::new(*expected, policy);
    decoder.push(buf)?;
    decoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use idx_wire::{encode_images, WireError};

    fn two_by_two(count: u8) -> (ImageHeader, Vec<u8>) {
        let records: Vec<Vec<u8>> = (0..count)
            .map(|i| (0..4).map(|j| i * 4 + j + 1).collect())
            .collect();
        let bytes = encode_images(2, 2, &records).unwrap();
        (ImageHeader::new(u32::from(count), 2, 2), bytes)
    }

    fn decode_in_chunks(header: ImageHeader, bytes: &[u8], size: usize) -> ImageRecords {
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        for chunk in bytes.chunks(size) {
            decoder.push(chunk).unwrap();
        }
        decoder.finish().unwrap()
    }

    #[test]
    fn three_chunk_scenario() {
        let (header, bytes) = two_by_two(2);
        // [header+1,2,3] [4,5,6] [7,8]
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);

        decoder.push(&bytes[..19]).unwrap();
        assert!(decoder.is_header_consumed());
        assert_eq!((decoder.completed(), decoder.carry()), (0, 3));

        decoder.push(&bytes[19..22]).unwrap();
        assert_eq!((decoder.completed(), decoder.carry()), (1, 2));

        decoder.push(&bytes[22..]).unwrap();
        assert_eq!((decoder.completed(), decoder.carry()), (2, 0));

        let records = decoder.finish().unwrap();
        assert_eq!(records.get(0), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(records.get(1), Some(&[5u8, 6, 7, 8][..]));
    }

    #[test]
    fn chunk_boundaries_do_not_change_output() {
        let (header, bytes) = two_by_two(7);
        let whole = decode_in_chunks(header, &bytes, bytes.len());
        for size in 1..=bytes.len() {
            assert_eq!(decode_in_chunks(header, &bytes, size), whole, "chunk size {size}");
        }
    }

    #[test]
    fn header_split_across_chunks() {
        let (header, bytes) = two_by_two(1);
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        decoder.push(&bytes[..5]).unwrap();
        assert!(!decoder.is_header_consumed());
        decoder.push(&bytes[5..]).unwrap();
        assert!(decoder.is_complete());
    }

    #[test]
    fn chunk_ending_on_record_boundary_leaves_no_carry() {
        let (header, bytes) = two_by_two(2);
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        decoder.push(&bytes[..20]).unwrap();
        assert_eq!((decoder.completed(), decoder.carry()), (1, 0));
    }

    #[test]
    fn empty_chunks_are_ignored() {
        let (header, bytes) = two_by_two(2);
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        decoder.push(&[]).unwrap();
        decoder.push(&bytes[..17]).unwrap();
        decoder.push(&[]).unwrap();
        decoder.push(&bytes[17..]).unwrap();
        assert_eq!(decoder.finish().unwrap().len(), 2);
    }

    #[test]
    fn truncated_by_one_byte_is_an_error() {
        let (header, bytes) = two_by_two(2);
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        decoder.push(&bytes[..bytes.len() - 1]).unwrap();
        assert!(matches!(
            decoder.finish(),
            Err(DecodeError::Truncated { expected: 2, completed: 1, carry: 3 })
        ));
    }

    #[test]
    fn stream_shorter_than_header_is_an_error() {
        let (header, bytes) = two_by_two(2);
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        decoder.push(&bytes[..10]).unwrap();
        assert!(matches!(
            decoder.finish(),
            Err(DecodeError::HeaderTruncated { received: 10 })
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let (header, mut bytes) = two_by_two(2);
        bytes.extend_from_slice(&[9, 9]);
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        assert!(matches!(
            decoder.push(&bytes),
            Err(DecodeError::TrailingData { extra_bytes: 2 })
        ));
        assert!(matches!(decoder.push(&[1]), Err(DecodeError::Poisoned)));
    }

    #[test]
    fn wrong_magic_is_rejected_before_records() {
        let (header, mut bytes) = two_by_two(2);
        bytes[2..4].copy_from_slice(&[0x08, 0x01]);
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        let err = decoder.push(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidHeader(WireError::InvalidMagic { found: 2049, .. })
        ));
        assert_eq!(decoder.completed(), 0);
    }

    #[test]
    fn wrong_magic_fails_as_soon_as_the_word_is_complete() {
        let mut decoder = ImageStreamDecoder::new(ImageHeader::new(2, 2, 2), HeaderPolicy::Strict);
        let err = decoder.push(&[0, 0, 8, 1]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidHeader(WireError::InvalidMagic { expected: 2051, found: 2049 })
        ));
        assert!(matches!(decoder.finish(), Err(DecodeError::Poisoned)));
    }

    #[test]
    fn magic_split_across_chunks_is_checked_once_complete() {
        let mut decoder = ImageStreamDecoder::new(ImageHeader::new(2, 2, 2), HeaderPolicy::Strict);
        decoder.push(&[0, 0]).unwrap();
        decoder.push(&[8]).unwrap();
        assert!(decoder.push(&[1, 0, 0]).is_err());

        let (header, bytes) = two_by_two(2);
        let mut decoder = ImageStreamDecoder::new(header, HeaderPolicy::Strict);
        for byte in &bytes[..6] {
            decoder.push(std::slice::from_ref(byte)).unwrap();
        }
        assert!(!decoder.is_header_consumed());
    }

    #[test]
    fn zero_magic_is_rejected_early_under_non_zero_policy() {
        let mut decoder = ImageStreamDecoder::new(ImageHeader::new(2, 2, 2), HeaderPolicy::NonZero);
        let err = decoder.push(&[0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHeader(WireError::ZeroWord { word: 0 })));
    }

    #[test]
    fn non_zero_policy_uses_declared_shape() {
        let (_, bytes) = two_by_two(3);
        let records = decode_images(&bytes, &ImageHeader::MNIST_TRAIN, HeaderPolicy::NonZero).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.record_size(), 4);
    }

    #[test]
    fn zero_sized_records_are_rejected() {
        let mut bytes = vec![0u8; IMAGE_HEADER_SIZE];
        ImageHeader::new(1, 0, 4).write_to(&mut bytes).unwrap();
        let expected = ImageHeader::new(1, 0, 4);
        assert!(matches!(
            decode_images(&bytes, &expected, HeaderPolicy::Strict),
            Err(DecodeError::EmptyRecord { rows: 0, cols: 4 })
        ));
    }

    #[test]
    fn zero_count_completes_at_header() {
        let bytes = encode_images::<[u8; 4]>(2, 2, &[]).unwrap();
        let records = decode_images(&bytes, &ImageHeader::new(0, 2, 2), HeaderPolicy::Strict).unwrap();
        assert!(records.is_empty());
    }
}
