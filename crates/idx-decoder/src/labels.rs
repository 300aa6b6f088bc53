use idx_wire::{HeaderPolicy, LabelHeader, LABEL_HEADER_SIZE};

use crate::error::DecodeError;

/// Decode a complete IDX label file into one byte per record.
///
/// Label files are small enough to arrive whole, so there is no chunk
/// state here: validate the 8-byte header, then slice past it.
///
/// # Errors
///
/// - [`DecodeError::InvalidHeader`] if the magic or count is rejected.
/// - [`DecodeError::Truncated`] if fewer labels follow than declared.
/// - [`DecodeError::TrailingData`] if more bytes follow than declared.
pub fn decode_labels(
    buf: &[u8],
    expected: &LabelHeader,
    policy: HeaderPolicy,
) -> Result<Vec<u8>, DecodeError> {
    let header =
        LabelHeader::read_from(buf, expected, policy).map_err(DecodeError::InvalidHeader)?;
    let body = &buf[LABEL_HEADER_SIZE..];
    let count = header.count as usize;

    if body.len() < count {
        return Err(DecodeError::Truncated {
            expected: count,
            completed: body.len(),
            carry: 0,
        });
    }
    if body.len() > count {
        return Err(DecodeError::TrailingData {
            extra_bytes: body.len() - count,
        });
    }
    Ok(body.to_vec())
}
