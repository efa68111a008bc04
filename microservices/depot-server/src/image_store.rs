//! Flat-directory image storage

use bytes::Bytes;
use depot_core::ImageName;
use futures_util::{Stream, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Prefix of in-progress upload files. Image names never start with '.',
/// so these cannot collide with stored content.
const PARTIAL_PREFIX: &str = ".upload-";

/// Stores uploaded files by name under a single root directory
pub struct ImageStore {
    root: PathBuf,
    upload_seq: AtomicU64,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            upload_seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &ImageName) -> PathBuf {
        self.root.join(name.as_str())
    }

    /// Write the whole stream under `name`, replacing any previous content.
    ///
    /// Data lands in a hidden sibling file that is renamed over the target
    /// once the stream is exhausted. A failed stream leaves the previous
    /// content in place.
    pub async fn store<S, E>(&self, name: &ImageName, body: S) -> Result<u64>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Into<Error>,
    {
        let seq = self.upload_seq.fetch_add(1, Ordering::Relaxed);
        let partial = self.root.join(format!("{}{}.part", PARTIAL_PREFIX, seq));

        match Self::write_stream(&partial, body).await {
            Ok(written) => {
                if let Err(e) = fs::rename(&partial, self.path_for(name)).await {
                    Self::discard(&partial).await;
                    return Err(e.into());
                }
                debug!(filename = %name, bytes = written, "Image stored");
                Ok(written)
            }
            Err(e) => {
                Self::discard(&partial).await;
                Err(e)
            }
        }
    }

    /// Open the file stored under `name` for streaming
    pub async fn retrieve(&self, name: &ImageName) -> Result<StoredImage> {
        let file = match fs::File::open(self.path_for(name)).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ImageNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();

        Ok(StoredImage { file, len })
    }

    async fn write_stream<S, E>(path: &Path, body: S) -> Result<u64>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Into<Error>,
    {
        let mut body = std::pin::pin!(body);
        let mut file = fs::File::create(path).await?;
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Into::into)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }

    async fn discard(partial: &Path) {
        if let Err(e) = fs::remove_file(partial).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %partial.display(), error = %e, "Failed to remove partial upload");
            }
        }
    }
}

/// An open stored image and its size at open time
#[derive(Debug)]
pub struct StoredImage {
    pub file: fs::File,
    pub len: u64,
}

impl StoredImage {
    /// Chunked byte stream over the file content
    pub fn into_stream(self) -> ReaderStream<fs::File> {
        ReaderStream::new(self.file)
    }
}

/// MIME type served for a stored file, derived from its extension
pub fn content_type(name: &ImageName) -> &'static str {
    match name.extension().as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("avif") => "image/avif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}
