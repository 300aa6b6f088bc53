use crate::error::WireError;
use crate::word::{check_word, WORD_SIZE};

/// Magic number of an image file (`idx3-ubyte`, unsigned bytes, 3 dims).
pub const IMAGE_MAGIC: u32 = 2051;

/// Magic number of a label file (`idx1-ubyte`, unsigned bytes, 1 dim).
pub const LABEL_MAGIC: u32 = 2049;

/// Record count declared by the MNIST train files.
pub const MNIST_TRAIN_COUNT: u32 = 60_000;

/// Image height in pixels.
pub const MNIST_ROWS: u32 = 28;

/// Image width in pixels.
pub const MNIST_COLS: u32 = 28;

/// Image header: magic, count, rows, cols.
pub const IMAGE_HEADER_SIZE: usize = 4 * WORD_SIZE;

/// Label header: magic, count.
pub const LABEL_HEADER_SIZE: usize = 2 * WORD_SIZE;

/// How strictly header words are compared with their expected values.
///
/// `Strict` is the default. `NonZero` only checks that each word is
/// non-zero, which is what the browser viewer this format loader grew
/// out of used to do; it is kept for files whose dimensions are not
/// known up front.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderPolicy {
    #[default]
    Strict,
    NonZero,
}

/// Header of an image file — the first 16 bytes of the stream.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────┐
/// │ Offset │ Size    │ Description                      │
/// ├────────┼─────────┼──────────────────────────────────┤
/// │ 0x00   │ 4 bytes │ Magic: 2051 (0x00000803), BE     │
/// │ 0x04   │ 4 bytes │ Record count, BE                 │
/// │ 0x08   │ 4 bytes │ Rows, BE                         │
/// │ 0x0C   │ 4 bytes │ Columns, BE                      │
/// └────────┴─────────┴──────────────────────────────────┘
/// ```
///
/// Records follow immediately, `rows * cols` bytes each, row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub count: u32,
    pub rows: u32,
    pub cols: u32,
}

impl ImageHeader {
    /// The MNIST train image file: 60000 images of 28x28.
    pub const MNIST_TRAIN: Self = Self {
        count: MNIST_TRAIN_COUNT,
        rows: MNIST_ROWS,
        cols: MNIST_COLS,
    };

    #[must_use]
    pub fn new(count: u32, rows: u32, cols: u32) -> Self {
        Self { count, rows, cols }
    }

    /// Bytes per record.
    #[must_use]
    pub fn record_size(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Bytes of record data following the header.
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.count as usize * self.record_size()
    }

    /// Write the 16-byte header into `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if `buf` is shorter than
    /// [`IMAGE_HEADER_SIZE`].
    pub fn write_to(&self, buf: &mut [u8]) -> Result<(), WireError> {
        if buf.len() < IMAGE_HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }
        buf[0..4].copy_from_slice(&IMAGE_MAGIC.to_be_bytes());
        buf[4..8].copy_from_slice(&self.count.to_be_bytes());
        buf[8..12].copy_from_slice(&self.rows.to_be_bytes());
        buf[12..16].copy_from_slice(&self.cols.to_be_bytes());
        Ok(())
    }

    /// Parse and validate the header at the start of `buf`.
    ///
    /// Words are checked in order (magic, count, rows, cols) so the first
    /// error names the most fundamental problem. Under
    /// [`HeaderPolicy::NonZero`] the returned header carries the values the
    /// file declares, which may differ from `expected`.
    ///
    /// # Errors
    ///
    /// Any [`WireError`] produced by [`check_word`].
    pub fn read_from(
        buf: &[u8],
        expected: &ImageHeader,
        policy: HeaderPolicy,
    ) -> Result<Self, WireError> {
        if buf.len() < IMAGE_HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }
        check_word(buf, 0, IMAGE_MAGIC, policy)?;
        let count = check_word(buf, 1, expected.count, policy)?;
        let rows = check_word(buf, 2, expected.rows, policy)?;
        let cols = check_word(buf, 3, expected.cols, policy)?;
        Ok(Self { count, rows, cols })
    }
}

impl Default for ImageHeader {
    fn default() -> Self {
        Self::MNIST_TRAIN
    }
}

/// Header of a label file — the first 8 bytes.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────┐
/// │ Offset │ Size    │ Description                      │
/// ├────────┼─────────┼──────────────────────────────────┤
/// │ 0x00   │ 4 bytes │ Magic: 2049 (0x00000801), BE     │
/// │ 0x04   │ 4 bytes │ Label count, BE                  │
/// └────────┴─────────┴──────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelHeader {
    pub count: u32,
}

impl LabelHeader {
    pub const MNIST_TRAIN: Self = Self {
        count: MNIST_TRAIN_COUNT,
    };

    #[must_use]
    pub fn new(count: u32) -> Self {
        Self { count }
    }

    /// Write the 8-byte header into `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if `buf` is shorter than
    /// [`LABEL_HEADER_SIZE`].
    pub fn write_to(&self, buf: &mut [u8]) -> Result<(), WireError> {
        if buf.len() < LABEL_HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }
        buf[0..4].copy_from_slice(&LABEL_MAGIC.to_be_bytes());
        buf[4..8].copy_from_slice(&self.count.to_be_bytes());
        Ok(())
    }

    /// Parse and validate the header at the start of `buf`.
    ///
    /// # Errors
    ///
    /// Any [`WireError`] produced by [`check_word`].
    pub fn read_from(
        buf: &[u8],
        expected: &LabelHeader,
        policy: HeaderPolicy,
    ) -> Result<Self, WireError> {
        if buf.len() < LABEL_HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }
        check_word(buf, 0, LABEL_MAGIC, policy)?;
        let count = check_word(buf, 1, expected.count, policy)?;
        Ok(Self { count })
    }
}

impl Default for LabelHeader {
    fn default() -> Self {
        Self::MNIST_TRAIN
    }
}
