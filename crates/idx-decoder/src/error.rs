use idx_wire::WireError;

/// Errors that can occur while decoding an IDX stream.
///
/// ```text
///   DecodeError
///   ├── InvalidHeader(WireError)  ← magic or declared shape rejected
///   ├── HeaderTruncated           ← stream ended inside the header
///   ├── Truncated                 ← stream ended before the last record
///   ├── TrailingData              ← bytes after the last declared record
///   ├── EmptyRecord               ← declared rows * cols is zero
///   ├── Poisoned                  ← chunk pushed after a failed chunk
///   └── Io(std::io::Error)        ← the chunk source failed
/// ```
///
/// Everything except `Io` is a format failure. `Io` means the transport
/// underneath the decoder broke and is reported as such by the loader.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The header failed validation.
    #[error("invalid header: {0}")]
    InvalidHeader(WireError),

    /// The stream ended before the fixed-size header was complete.
    #[error("stream ended inside the header after {received} bytes")]
    HeaderTruncated { received: usize },

    /// The stream ended before every declared record was complete.
    ///
    /// `carry` is the number of bytes already written into the record
    /// that was in progress when the stream stopped.
    #[error("stream ended after {completed} of {expected} records ({carry} bytes into the next)")]
    Truncated {
        expected: usize,
        completed: usize,
        carry: usize,
    },

    /// More bytes arrived than the header declared.
    #[error("unexpected data after the last record ({extra_bytes} bytes)")]
    TrailingData { extra_bytes: usize },

    /// The header declared zero-sized records.
    #[error("header declares {rows}x{cols} records, which hold no bytes")]
    EmptyRecord { rows: u32, cols: u32 },

    /// A chunk was pushed into a decoder that already reported an error.
    #[error("decoder already failed; start a new stream")]
    Poisoned,

    /// An I/O error from the underlying chunk source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
