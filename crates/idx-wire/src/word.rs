use crate::error::WireError;
use crate::header::HeaderPolicy;

/// Every header field is one big-endian `u32`.
pub const WORD_SIZE: usize = 4;

/// Read the big-endian `u32` at `word_offset * 4`.
///
/// # Errors
///
/// Returns [`WireError::UnexpectedEof`] if the buffer ends before the
/// word does.
pub fn read_word(buf: &[u8], word_offset: usize) -> Result<u32, WireError> {
    let start = word_offset * WORD_SIZE;
    let bytes = buf
        .get(start..start + WORD_SIZE)
        .ok_or(WireError::UnexpectedEof { offset: buf.len() })?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Validate one header word against its expected value.
///
/// The word is located in 32-bit units, so `word_offset = 1` reads bytes
/// `4..8`. How strictly the value is compared depends on `policy`:
///
/// ```text
/// ┌──────────┬───────────────────────────────────────────────────────┐
/// │ Policy   │ Accepts                                               │
/// ├──────────┼───────────────────────────────────────────────────────┤
/// │ Strict   │ found == expected                                     │
/// │ NonZero  │ found != 0 (expected is only used for the message)    │
/// └──────────┴───────────────────────────────────────────────────────┘
/// ```
///
/// Returns the decoded word so callers can keep the declared value.
///
/// # Errors
///
/// - [`WireError::UnexpectedEof`] if the buffer is too short.
/// - [`WireError::InvalidMagic`] for a strict mismatch on word 0.
/// - [`WireError::FieldMismatch`] for a strict mismatch on any other word.
/// - [`WireError::ZeroWord`] for a zero word under `NonZero`.
pub fn check_word(
    buf: &[u8],
    word_offset: usize,
    expected: u32,
    policy: HeaderPolicy,
) -> Result<u32, WireError> {
    let found = read_word(buf, word_offset)?;
    match policy {
        HeaderPolicy::Strict if found != expected => {
            if word_offset == 0 {
                Err(WireError::InvalidMagic { expected, found })
            } else {
                Err(WireError::FieldMismatch {
                    word: word_offset,
                    expected,
                    found,
                })
            }
        }
        HeaderPolicy::NonZero if found == 0 => Err(WireError::ZeroWord { word: word_offset }),
        _ => Ok(found),
    }
}
