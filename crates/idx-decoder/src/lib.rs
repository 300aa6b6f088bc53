#![warn(clippy::pedantic)]

pub mod error;
pub mod image_stream;
pub mod labels;
pub mod records;
pub mod source;

pub use error::DecodeError;
pub use image_stream::{decode_images, ImageStreamDecoder};
pub use labels::decode_labels;
pub use records::ImageRecords;
pub use source::{
    collect_chunks, decode_image_stream, ChunkIter, ChunkSource, ReaderChunks, DEFAULT_CHUNK_SIZE,
};
