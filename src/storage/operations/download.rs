use crate::error::{CancelledSnafu, Error, Result};
use crate::storage::adapter::{ListingEntry, ObjectStore};
use crate::storage::constants::PARTIAL_FILE_SUFFIX;
use crate::storage::operations::report::{DownloadReport, TransferFailure};
use crate::storage::operations::{FailurePolicy, SyncOptions};
use crate::storage::utils::path::{is_directory_marker, to_local_path, to_local_relative_path};
use crate::wrap_err;
use futures::stream::{self, StreamExt, TryStreamExt};
use snafu::ensure;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Trait for mirroring a remote folder into a local directory tree.
#[allow(async_fn_in_trait)]
pub trait Downloader {
    /// Download every object under `remote_source_prefix` into
    /// `local_destination_folder`, recreating the key hierarchy.
    ///
    /// # Arguments
    /// * `remote_source_prefix` - Remote folder to mirror
    /// * `local_destination_folder` - Local root; created on demand
    /// * `cancel` - Stops the run; partially written files are removed
    ///
    /// # Returns
    /// * `Result<DownloadReport>` - Counts of materialized entries and, with
    ///   `FailurePolicy::Continue`, the objects that failed
    async fn download_folder(
        &self,
        remote_source_prefix: &str,
        local_destination_folder: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport>;
}

/// What one listing entry turned into on disk.
enum Materialized {
    File { path: PathBuf, bytes: u64 },
    Directory,
    Skipped,
}

/// Download pipeline over any `ObjectStore`.
pub struct FolderDownloader<'a, S> {
    store: &'a S,
    options: SyncOptions,
}

impl<'a, S: ObjectStore> FolderDownloader<'a, S> {
    pub fn new(store: &'a S, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Map one listing entry onto the local tree.
    async fn materialize(
        &self,
        prefix: &str,
        root: &Path,
        entry: &ListingEntry,
        cancel: &CancellationToken,
    ) -> Result<Materialized> {
        // An aborted run only drains transfers that already started.
        ensure!(!cancel.is_cancelled(), CancelledSnafu);
        let relative = to_local_relative_path(prefix, &entry.key)?;
        let local_path = to_local_path(root, &relative);

        if is_directory_marker(&entry.key) {
            wrap_err!(
                fs::create_dir_all(&local_path).await,
                ObjectTransferFailed {
                    key: entry.key.clone(),
                    local_path: local_path.clone()
                }
            )?;
            return Ok(Materialized::Directory);
        }

        if relative.is_empty() {
            log::warn!(
                "skipping object '{}': it has no name below prefix '{prefix}'",
                entry.key
            );
            return Ok(Materialized::Skipped);
        }

        match self.download_object(&entry.key, &local_path, cancel).await {
            Ok(bytes) => Ok(Materialized::File {
                path: local_path,
                bytes,
            }),
            Err(Error::Cancelled) => CancelledSnafu.fail(),
            Err(e) => Err(Error::ObjectTransferFailed {
                key: entry.key.clone(),
                local_path,
                source: Box::new(e),
            }),
        }
    }

    /// Stream `key` into `local_path` through a sibling partial file.
    async fn download_object(
        &self,
        key: &str,
        local_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        ensure!(!cancel.is_cancelled(), CancelledSnafu);
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(local_path);
        let written = match self.stream_to_file(key, &partial, cancel).await {
            Ok(written) => fs::rename(&partial, local_path)
                .await
                .map(|()| written)
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        if written.is_err() {
            remove_partial(&partial).await;
        }
        written
    }

    async fn stream_to_file(&self, key: &str, path: &Path, cancel: &CancellationToken) -> Result<u64> {
        let mut body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return CancelledSnafu.fail(),
            body = self.store.get_object(key) => body?,
        };

        let mut file = fs::File::create(path).await?;
        let mut written = 0u64;
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return CancelledSnafu.fail(),
                chunk = body.try_next() => chunk?,
            };
            let Some(chunk) = chunk else {
                break;
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

/// `dir/name` → `dir/.name.spacesync-part`
fn partial_path(local_path: &Path) -> PathBuf {
    let name = local_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    local_path.with_file_name(format!(".{name}{PARTIAL_FILE_SUFFIX}"))
}

async fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("failed to remove partial file {}: {e}", path.display());
        }
    }
}

impl<S: ObjectStore> Downloader for FolderDownloader<'_, S> {
    async fn download_folder(
        &self,
        remote_source_prefix: &str,
        local_destination_folder: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport> {
        ensure!(!cancel.is_cancelled(), CancelledSnafu);
        let entries = wrap_err!(
            self.store.list_objects(remote_source_prefix).await,
            ListingFailed {
                prefix: remote_source_prefix.to_string()
            }
        )?;
        log::debug!(
            "listed prefix={remote_source_prefix} entries={}",
            entries.len()
        );
        if entries.is_empty() {
            log::warn!("no objects found under '{remote_source_prefix}'");
        }

        // Cancelled on abort so in-flight siblings stop and clean up.
        let run = cancel.child_token();
        let mut report = DownloadReport::new(remote_source_prefix, local_destination_folder);
        let mut first_error = None;

        let mut downloads = stream::iter(entries.into_iter().map(|entry| {
            let run = &run;
            async move {
                let outcome = self
                    .materialize(remote_source_prefix, local_destination_folder, &entry, run)
                    .await;
                (entry.key, outcome)
            }
        }))
        .buffered(self.options.concurrency.max(1));

        while let Some((key, outcome)) = downloads.next().await {
            match outcome {
                Ok(Materialized::File { path, bytes }) => {
                    println!("Downloaded: {key} → {}", path.display());
                    report.files += 1;
                    report.bytes += bytes;
                }
                Ok(Materialized::Directory) => report.directories += 1,
                Ok(Materialized::Skipped) => report.skipped.push(key),
                Err(Error::Cancelled) => {}
                Err(error) => {
                    eprintln!("{error}");
                    match self.options.failure_policy {
                        FailurePolicy::Abort => {
                            if first_error.is_none() {
                                run.cancel();
                                first_error = Some(error);
                            }
                        }
                        FailurePolicy::Continue => {
                            report.failures.push(TransferFailure::new(key, error))
                        }
                    }
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }
        ensure!(!cancel.is_cancelled(), CancelledSnafu);
        Ok(report)
    }
}
