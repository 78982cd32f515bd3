// Object storage adapter consumed by the upload and download pipelines
use crate::error::{Error, Result};
use crate::storage::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_CHUNK_SIZE};
use crate::storage::utils::path::{directory_marker_key, is_directory_marker};
use crate::storage::utils::url::PublicUrlBuilder;
use bytes::Bytes;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use opendal::{Operator, Writer};
use std::io;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

/// Lazy, single-pass object body.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// One object found under a listed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub key: String,
    pub size: u64,
}

/// Storage operations the synchronization pipelines depend on.
///
/// Implementations must be safe to share between the in-flight transfers of
/// one pipeline run.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Write `body` under `key`. A key ending in '/' writes a directory marker
    /// and ignores the body.
    async fn put_object(&self, key: &str, body: ByteStream) -> Result<()>;

    /// List every object below `prefix`, recursively and fully paginated.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ListingEntry>>;

    /// Open the body of `key` as a byte stream.
    async fn get_object(&self, key: &str) -> Result<ByteStream>;

    /// Public URL of an object written with public-read visibility.
    fn public_url(&self, key: &str) -> String;
}

/// Body of a directory marker.
pub fn empty_body() -> ByteStream {
    stream::empty().boxed()
}

/// Stream a local file in `DEFAULT_BUFFER_SIZE` chunks.
pub fn file_body(file: fs::File) -> ByteStream {
    stream::try_unfold(file, |mut file| async move {
        let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE];
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            return Ok::<_, io::Error>(None);
        }
        buffer.truncate(bytes_read);
        Ok(Some((Bytes::from(buffer), file)))
    })
    .boxed()
}

/// End `body` with an `Interrupted` error once `cancel` fires.
///
/// The store sees a failed body rather than a dropped future, so a partially
/// written object is aborted instead of committed or left dangling.
pub fn cancellable(body: ByteStream, cancel: CancellationToken) -> ByteStream {
    let stopped = cancel.clone();
    body.take_until(cancel.cancelled_owned())
        .chain(
            stream::once(async move {
                stopped
                    .is_cancelled()
                    .then(|| Err(io::Error::new(io::ErrorKind::Interrupted, "transfer cancelled")))
            })
            .filter_map(future::ready),
        )
        .boxed()
}

/// `ObjectStore` backed by an OpenDAL operator.
#[derive(Clone)]
pub struct OpenDalStore {
    operator: Operator,
    public_urls: PublicUrlBuilder,
}

impl OpenDalStore {
    pub fn new(operator: Operator, public_urls: PublicUrlBuilder) -> Self {
        Self {
            operator,
            public_urls,
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    async fn write_stream(&self, key: &str, mut body: ByteStream) -> Result<()> {
        let mut writer = self
            .operator
            .writer_with(key)
            .chunk(DEFAULT_CHUNK_SIZE)
            .await?;

        match copy_into(&mut writer, &mut body).await {
            Ok(()) => {
                writer.close().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    log::warn!("abort write key={key} failed: {abort_err}");
                }
                Err(e)
            }
        }
    }
}

async fn copy_into(writer: &mut Writer, body: &mut ByteStream) -> Result<()> {
    while let Some(chunk) = body.try_next().await? {
        writer.write(chunk).await?;
    }
    Ok(())
}

impl ObjectStore for OpenDalStore {
    async fn put_object(&self, key: &str, body: ByteStream) -> Result<()> {
        if is_directory_marker(key) {
            self.operator.create_dir(key).await?;
            Ok(())
        } else {
            self.write_stream(key, body).await
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ListingEntry>> {
        let lister = self
            .operator
            .lister_with(&directory_marker_key(prefix))
            .recursive(true)
            .await?;

        lister
            .map_ok(|entry| ListingEntry {
                key: entry.path().to_string(),
                size: entry.metadata().content_length(),
            })
            .map_err(Error::from)
            .try_collect()
            .await
    }

    async fn get_object(&self, key: &str) -> Result<ByteStream> {
        let reader = self
            .operator
            .reader_with(key)
            .chunk(DEFAULT_CHUNK_SIZE)
            .await?;
        let stream = reader.into_bytes_stream(..).await?;
        Ok(stream.boxed())
    }

    fn public_url(&self, key: &str) -> String {
        self.public_urls.url(key)
    }
}
