#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod loader;
pub mod mnist;
pub mod transport;

pub use config::LoaderConfig;
pub use error::{LoadError, TransportError};
pub use loader::{DatasetLoader, LoadStats};
pub use mnist::{Mnist, SplitData};
pub use transport::{resource_name, FileTransport, HttpChunks, HttpTransport, Transport};
