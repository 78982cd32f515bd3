use crate::error::{CancelledSnafu, Error, InvalidFileNameSnafu, Result, SourceNotFoundSnafu};
use crate::storage::adapter::{ObjectStore, cancellable, empty_body, file_body};
use crate::storage::operations::SyncOptions;
use crate::storage::operations::report::{TransferFailure, UploadReport};
use crate::storage::utils::path::{directory_marker_key, to_remote_key, utf8_file_name};
use crate::wrap_err;
use futures::stream::{self, StreamExt};
use snafu::ensure;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::sync::CancellationToken;

/// Trait for uploading the files of a local folder into a remote folder.
#[allow(async_fn_in_trait)]
pub trait Uploader {
    /// Upload every file directly inside `local_source_folder` under
    /// `remote_destination_prefix`.
    ///
    /// # Arguments
    /// * `local_source_folder` - Existing local directory; sub-directories are skipped
    /// * `remote_destination_prefix` - Remote folder, created as a directory marker first
    /// * `cancel` - Stops the run; objects not yet completed are never committed
    ///
    /// # Returns
    /// * `Result<UploadReport>` - Public URLs in enumeration order plus per-file failures
    async fn upload_folder(
        &self,
        local_source_folder: &Path,
        remote_destination_prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<UploadReport>;
}

/// One immediate child of the source folder.
enum LocalEntry {
    File { path: PathBuf, name: String },
    Directory(PathBuf),
    InvalidName(PathBuf),
}

/// Upload pipeline over any `ObjectStore`.
pub struct FolderUploader<'a, S> {
    store: &'a S,
    options: SyncOptions,
}

impl<'a, S: ObjectStore> FolderUploader<'a, S> {
    pub fn new(store: &'a S, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Enumerate one level of `source`, following symlinks to classify entries.
    async fn enumerate(&self, source: &Path) -> Result<Vec<LocalEntry>> {
        let is_dir = fs::metadata(source)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        ensure!(
            is_dir,
            SourceNotFoundSnafu {
                path: source.to_path_buf()
            }
        );

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(source).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            // Unreadable entries are classified as files so the failure stays per-file.
            let is_dir = fs::metadata(&path)
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false);
            let name = utf8_file_name(&path).map(str::to_string);
            entries.push(match (is_dir, name) {
                (true, _) => LocalEntry::Directory(path),
                (false, Some(name)) => LocalEntry::File { path, name },
                (false, None) => LocalEntry::InvalidName(path),
            });
        }

        log::debug!(
            "enumerated source={} entries={}",
            source.display(),
            entries.len()
        );
        Ok(entries)
    }

    /// Stream one file to `key`, returning the number of bytes sent.
    async fn upload_file(&self, path: &Path, key: &str, cancel: &CancellationToken) -> Result<u64> {
        ensure!(!cancel.is_cancelled(), CancelledSnafu);
        let file = fs::File::open(path).await?;
        let size = file.metadata().await?.len();

        let body = cancellable(file_body(file), cancel.clone());
        match self.store.put_object(key, body).await {
            Ok(()) => Ok(size),
            Err(_) if cancel.is_cancelled() => CancelledSnafu.fail(),
            Err(e) => Err(e),
        }
    }
}

impl<S: ObjectStore> Uploader for FolderUploader<'_, S> {
    async fn upload_folder(
        &self,
        local_source_folder: &Path,
        remote_destination_prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<UploadReport> {
        ensure!(!cancel.is_cancelled(), CancelledSnafu);
        let entries = self.enumerate(local_source_folder).await?;

        let marker = directory_marker_key(remote_destination_prefix);
        wrap_err!(
            self.store.put_object(&marker, empty_body()).await,
            FolderCreationFailed {
                prefix: remote_destination_prefix.to_string()
            }
        )?;
        println!("Folder created: {marker}");

        let mut report = UploadReport::new(remote_destination_prefix);
        let mut files = Vec::new();
        for entry in entries {
            match entry {
                LocalEntry::File { path, name } => {
                    let key = to_remote_key(remote_destination_prefix, &name);
                    files.push((path, key));
                }
                LocalEntry::Directory(path) => {
                    println!("Skipping directory: {}", path.display());
                    report.skipped.push(path);
                }
                LocalEntry::InvalidName(path) => {
                    let error = InvalidFileNameSnafu { path: path.clone() }.build();
                    eprintln!("{error}");
                    report
                        .failures
                        .push(TransferFailure::new(path.display().to_string(), error));
                }
            }
        }

        let mut uploads = stream::iter(files.into_iter().map(|(path, key)| async move {
            let outcome = self.upload_file(&path, &key, cancel).await;
            (path, key, outcome)
        }))
        .buffered(self.options.concurrency.max(1));

        while let Some((path, key, outcome)) = uploads.next().await {
            match outcome {
                Ok(bytes) => {
                    println!("Uploaded: {} → {key} ({bytes} bytes)", path.display());
                    report.urls.push(self.store.public_url(&key));
                    report.bytes += bytes;
                }
                Err(Error::Cancelled) => {}
                Err(source) => {
                    let error = Error::ObjectUploadFailed {
                        local_path: path.clone(),
                        key,
                        source: Box::new(source),
                    };
                    eprintln!("{error}");
                    report
                        .failures
                        .push(TransferFailure::new(path.display().to_string(), error));
                }
            }
        }

        ensure!(!cancel.is_cancelled(), CancelledSnafu);
        Ok(report)
    }
}
