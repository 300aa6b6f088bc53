// Inverse of the header readers: produce canonical IDX bytes.
// The cache stores payloads in this form, and the tests and benches
// build their synthetic streams with it.

use crate::error::WireError;
use crate::header::{ImageHeader, LabelHeader, IMAGE_HEADER_SIZE, LABEL_HEADER_SIZE};

/// Encode image records as an IDX image file.
///
/// Every record must be exactly `rows * cols` bytes.
///
/// # Errors
///
/// - [`WireError::RecordSize`] if a record has the wrong length.
/// - [`WireError::TooManyRecords`] if the count does not fit in a `u32`.
pub fn encode_images<R: AsRef<[u8]>>(
    rows: u32,
    cols: u32,
    records: &[R],
) -> Result<Vec<u8>, WireError> {
    let count = u32::try_from(records.len()).map_err(|_| WireError::TooManyRecords {
        count: records.len(),
    })?;
    let header = ImageHeader::new(count, rows, cols);
    let record_size = header.record_size();

    let mut out = vec![0u8; IMAGE_HEADER_SIZE];
    header.write_to(&mut out)?;
    out.reserve(header.body_len());

    for (index, record) in records.iter().enumerate() {
        let record = record.as_ref();
        if record.len() != record_size {
            return Err(WireError::RecordSize {
                index,
                expected: record_size,
                found: record.len(),
            });
        }
        out.extend_from_slice(record);
    }
    Ok(out)
}

/// Encode a label sequence as an IDX label file.
///
/// # Errors
///
/// Returns [`WireError::TooManyRecords`] if the count does not fit in a `u32`.
pub fn encode_labels(labels: &[u8]) -> Result<Vec<u8>, WireError> {
    let count = u32::try_from(labels.len()).map_err(|_| WireError::TooManyRecords {
        count: labels.len(),
    })?;
    let mut out = vec![0u8; LABEL_HEADER_SIZE];
    LabelHeader::new(count).write_to(&mut out)?;
    out.extend_from_slice(labels);
    Ok(out)
}
