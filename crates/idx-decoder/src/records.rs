use idx_wire::{encode_images, ImageHeader, WireError};

/// A fully decoded image file: fixed-size records in file order.
///
/// Only a completed decode produces one of these, so `len()` always
/// equals the count the header declared. Records are stored as separate
/// boxed slices, one allocation per image, which is also the unit the
/// rendering side indexes by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecords {
    rows: u32,
    cols: u32,
    records: Vec<Box<[u8]>>,
}

impl ImageRecords {
    pub(crate) fn from_parts(rows: u32, cols: u32, records: Vec<Box<[u8]>>) -> Self {
        Self { rows, cols, records }
    }

    /// Build a collection from already materialised records.
    ///
    /// # Errors
    ///
    /// - [`WireError::RecordSize`] if any record is not `rows * cols` bytes.
    /// - [`WireError::TooManyRecords`] if there are more than `u32::MAX`.
    pub fn from_records(rows: u32, cols: u32, records: Vec<Box<[u8]>>) -> Result<Self, WireError> {
        if u32::try_from(records.len()).is_err() {
            return Err(WireError::TooManyRecords {
                count: records.len(),
            });
        }
        let record_size = rows as usize * cols as usize;
        if let Some((index, bad)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != record_size)
        {
            return Err(WireError::RecordSize {
                index,
                expected: record_size,
                found: bad.len(),
            });
        }
        Ok(Self { rows, cols, records })
    }

    /// An empty collection, used for splits that are not loaded.
    #[must_use]
    pub fn empty(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub fn record_size(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// The record at `index`, row-major.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.records.get(index).map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[u8]> {
        self.records.iter().map(AsRef::as_ref)
    }

    /// Header describing this collection.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn header(&self) -> ImageHeader {
        // from_parts/from_records never hold more than u32::MAX records
        ImageHeader::new(self.records.len() as u32, self.rows, self.cols)
    }

    /// All records concatenated into one `len * record_size` buffer.
    ///
    /// This is the layout a numerical back end expects for an
    /// `(images, pixels)` matrix.
    #[must_use]
    pub fn flatten(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * self.record_size());
        for record in &self.records {
            out.extend_from_slice(record);
        }
        out
    }

    /// Re-encode as a canonical IDX image file.
    ///
    /// # Errors
    ///
    /// Propagates [`WireError`] from [`encode_images`]; cannot fail for a
    /// collection produced by the decoder.
    pub fn to_idx_bytes(&self) -> Result<Vec<u8>, WireError> {
        encode_images(self.rows, self.cols, &self.records)
    }
}
