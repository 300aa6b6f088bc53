/// Errors raised while validating or writing IDX headers.
///
/// Every variant is a format failure: the bytes in front of us are not
/// the dataset we were told to expect. The decoder wraps these in
/// `DecodeError::InvalidHeader`, the loader surfaces them unchanged.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Input ended before the word at `offset` (in bytes) could be read.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Word 0 did not hold the expected magic number.
    #[error("invalid magic number: expected {expected}, got {found}")]
    InvalidMagic { expected: u32, found: u32 },

    /// A dimension word (count, rows, cols) did not match the expected shape.
    #[error("header word {word} mismatch: expected {expected}, got {found}")]
    FieldMismatch { word: usize, expected: u32, found: u32 },

    /// A header word was zero under the lenient (non-zero) policy.
    #[error("header word {word} is zero")]
    ZeroWord { word: usize },

    /// A record handed to the encoder had the wrong length.
    #[error("record {index} is {found} bytes, expected {expected}")]
    RecordSize {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// More records than a 32-bit count word can declare.
    #[error("{count} records do not fit in a 32-bit count word")]
    TooManyRecords { count: usize },
}

// NOTE on the variants
// InvalidMagic and FieldMismatch carry both sides of the comparison so
// the message alone is enough to tell a label file handed to the image
// decoder (2049 vs 2051) from a truncated or corrupt download.
// Offsets are always in bytes from the start of the buffer, word indices
// are always in 32-bit units. Mixing the two in one message is how
// off-by-four bugs hide.
