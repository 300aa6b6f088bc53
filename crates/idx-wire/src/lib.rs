#![warn(clippy::pedantic)]

pub mod encode;
pub mod error;
pub mod header;
pub mod word;

pub use encode::{encode_images, encode_labels};
pub use error::WireError;
pub use header::{
    HeaderPolicy, ImageHeader, LabelHeader, IMAGE_HEADER_SIZE, IMAGE_MAGIC, LABEL_HEADER_SIZE,
    LABEL_MAGIC,
};
pub use word::{check_word, read_word, WORD_SIZE};
