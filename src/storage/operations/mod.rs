// Folder synchronization pipelines
pub mod download;
pub mod report;
pub mod upload;

pub use download::{Downloader, FolderDownloader};
pub use report::{DownloadReport, TransferFailure, UploadReport};
pub use upload::{FolderUploader, Uploader};

use crate::storage::constants::DEFAULT_CONCURRENCY;

/// What the download pipeline does after one object fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failed object and return its error.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Continue,
}

/// Knobs shared by both pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum number of transfers in flight; results keep enumeration order.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl SyncOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
        }
    }
}
