#![warn(clippy::pedantic)]

pub mod compression;
pub mod error;
pub mod key;
pub mod memory;
pub mod payload;
pub mod sqlite;
pub mod store;

pub use error::{CacheError, PayloadError};
pub use key::{DatasetKey, Kind, Split};
pub use memory::MemoryDatasetCache;
pub use payload::Payload;
pub use sqlite::SqliteDatasetCache;
pub use store::DatasetCache;
