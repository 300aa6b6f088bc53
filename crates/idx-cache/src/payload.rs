use idx_decoder::{decode_images, decode_labels, DecodeError, ImageRecords};
use idx_wire::{encode_labels, read_word, HeaderPolicy, ImageHeader, LabelHeader, WireError};

use crate::compression::{compress, decompress, MAX_PAYLOAD_SIZE};
use crate::error::PayloadError;
use crate::key::Kind;

/// A whole decoded dataset, either shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Images(ImageRecords),
    Labels(Vec<u8>),
}

impl Payload {
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Images(_) => Kind::Images,
            Self::Labels(_) => Kind::Labels,
        }
    }

    /// Number of records (images or labels).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Images(records) => records.len(),
            Self::Labels(labels) => labels.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical IDX encoding of the payload.
    ///
    /// # Errors
    ///
    /// [`WireError`] if the payload cannot be described by an IDX header.
    pub fn to_idx_bytes(&self) -> Result<Vec<u8>, WireError> {
        match self {
            Self::Images(records) => records.to_idx_bytes(),
            Self::Labels(labels) => encode_labels(labels),
        }
    }

    /// Parse a canonical IDX encoding of the given kind.
    ///
    /// The shape is taken from the bytes themselves; the magic must match
    /// `kind` exactly.
    ///
    /// # Errors
    ///
    /// [`DecodeError`] if the bytes are not a well-formed file.
    pub fn from_idx_bytes(kind: Kind, bytes: &[u8]) -> Result<Self, DecodeError> {
        let word = |i| read_word(bytes, i).map_err(DecodeError::InvalidHeader);
        match kind {
            Kind::Images => {
                let declared = ImageHeader::new(word(1)?, word(2)?, word(3)?);
                decode_images(bytes, &declared, HeaderPolicy::Strict).map(Self::Images)
            }
            Kind::Labels => {
                let declared = LabelHeader::new(word(1)?);
                decode_labels(bytes, &declared, HeaderPolicy::Strict).map(Self::Labels)
            }
        }
    }
}

/// The at-rest form of a [`Payload`].
///
/// ```text
/// ┌────────────┬──────────────────────────────────────────────────┐
/// │ Field      │ Meaning                                          │
/// ├────────────┼──────────────────────────────────────────────────┤
/// │ kind       │ "images" | "labels"                              │
/// │ digest     │ BLAKE3 of the uncompressed IDX bytes             │
/// │ compressed │ body is a zstd frame                             │
/// │ raw_len    │ length of the uncompressed IDX bytes             │
/// │ body       │ IDX bytes, zstd-compressed when that was smaller │
/// └────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredPayload {
    pub kind: Kind,
    pub digest: [u8; 32],
    pub compressed: bool,
    pub raw_len: usize,
    pub body: Vec<u8>,
}

impl StoredPayload {
    /// Serialise a payload for storage.
    ///
    /// # Errors
    ///
    /// [`WireError`] from [`Payload::to_idx_bytes`].
    pub fn seal(payload: &Payload) -> Result<Self, WireError> {
        let raw = payload.to_idx_bytes()?;
        let digest: [u8; 32] = blake3::hash(&raw).into();
        let raw_len = raw.len();
        let (compressed, body) = match compress(&raw) {
            Some(smaller) => (true, smaller),
            None => (false, raw),
        };
        Ok(Self {
            kind: payload.kind(),
            digest,
            compressed,
            raw_len,
            body,
        })
    }

    /// Verify and decode back into a payload.
    ///
    /// # Errors
    ///
    /// The [`PayloadError`] for whichever check failed first: decompression,
    /// recorded length, digest, then the IDX decode.
    pub fn open(&self) -> Result<Payload, PayloadError> {
        let raw = if self.compressed {
            decompress(&self.body, MAX_PAYLOAD_SIZE)?
        } else {
            self.body.clone()
        };
        if raw.len() != self.raw_len {
            return Err(PayloadError::LengthMismatch {
                actual: raw.len(),
                recorded: self.raw_len,
            });
        }
        let digest: [u8; 32] = blake3::hash(&raw).into();
        if digest != self.digest {
            return Err(PayloadError::DigestMismatch);
        }
        Ok(Payload::from_idx_bytes(self.kind, &raw)?)
    }
}
