use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use idx_cache::{DatasetKey, Kind, Split};
use idx_decoder::{ChunkSource, ReaderChunks, DEFAULT_CHUNK_SIZE};
use log::debug;

use crate::error::TransportError;

/// Stable resource name of each dataset file.
#[must_use]
pub fn resource_name(key: DatasetKey) -> &'static str {
    match (key.split, key.kind) {
        (Split::Train, Kind::Images) => "train-images.idx3-ubyte",
        (Split::Train, Kind::Labels) => "train-labels.idx1-ubyte",
        (Split::Test, Kind::Images) => "t10k-images.idx3-ubyte",
        (Split::Test, Kind::Labels) => "t10k-labels.idx1-ubyte",
    }
}

/// Something that can open a named resource as a stream of chunks.
///
/// The loader only ever asks for a resource when the cache misses.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Source: ChunkSource;

    /// # Errors
    ///
    /// [`TransportError::NotFound`] if there is no such resource, other
    /// variants if it cannot be opened.
    async fn open(&self, resource: &str) -> Result<Self::Source, TransportError>;
}

/// Resources are files under a local directory.
pub struct FileTransport {
    root: PathBuf,
    chunk_size: usize,
}

impl FileTransport {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Transport for FileTransport {
    type Source = ReaderChunks<tokio::fs::File>;

    async fn open(&self, resource: &str) -> Result<Self::Source, TransportError> {
        let path = self.root.join(resource);
        debug!("opening {}", path.display());
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(ReaderChunks::with_chunk_size(file, self.chunk_size)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(TransportError::NotFound {
                resource: resource.to_string(),
            }),
            Err(source) => Err(TransportError::Io {
                resource: resource.to_string(),
                source,
            }),
        }
    }
}

/// Resources are fetched over HTTP(S) relative to a base URL.
///
/// The response body is consumed as it arrives; chunk boundaries are
/// whatever the connection delivers.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    #[must_use]
    pub fn url_for(&self, resource: &str) -> String {
        format!("{}{resource}", self.base_url)
    }
}

impl Transport for HttpTransport {
    type Source = HttpChunks;

    async fn open(&self, resource: &str) -> Result<Self::Source, TransportError> {
        let url = self.url_for(resource);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                resource: resource.to_string(),
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound {
                resource: resource.to_string(),
            });
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(HttpChunks {
            stream: Box::pin(response.bytes_stream()),
        })
    }
}

/// Body chunks of an HTTP response.
pub struct HttpChunks {
    stream: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
}

impl ChunkSource for HttpChunks {
    async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        self.stream
            .next()
            .await
            .map(|chunk| chunk.map_err(io::Error::other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_follow_mnist_files() {
        assert_eq!(
            resource_name(DatasetKey::new(Split::Train, Kind::Images)),
            "train-images.idx3-ubyte"
        );
        assert_eq!(
            resource_name(DatasetKey::new(Split::Train, Kind::Labels)),
            "train-labels.idx1-ubyte"
        );
        assert_eq!(
            resource_name(DatasetKey::new(Split::Test, Kind::Labels)),
            "t10k-labels.idx1-ubyte"
        );
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:8080/data");
        assert_eq!(
            transport.url_for("train-labels.idx1-ubyte"),
            "http://localhost:8080/data/train-labels.idx1-ubyte"
        );
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FileTransport::new(dir.path());
        let result = transport.open("train-images.idx3-ubyte").await;
        assert!(matches!(result, Err(TransportError::NotFound { .. })));
    }

    #[tokio::test]
    async fn file_is_read_in_configured_chunks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blob"), [1u8, 2, 3, 4, 5]).unwrap();
        let transport = FileTransport::new(dir.path()).with_chunk_size(2);
        let mut source = transport.open("blob").await.unwrap();

        let mut sizes = Vec::new();
        while let Some(chunk) = source.next_chunk().await {
            sizes.push(chunk.unwrap().len());
        }
        assert_eq!(sizes.iter().sum::<usize>(), 5);
        assert!(sizes.iter().all(|&n| n <= 2));
    }
}
