// Aggregated outcomes of one synchronization run
use crate::error::Error;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::path::PathBuf;

/// A single file or object that could not be transferred.
#[derive(Debug)]
pub struct TransferFailure {
    /// Local path (uploads) or object key (downloads).
    pub target: String,
    pub error: Error,
}

impl TransferFailure {
    pub fn new(target: impl Into<String>, error: Error) -> Self {
        Self {
            target: target.into(),
            error,
        }
    }
}

impl Serialize for TransferFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TransferFailure", 2)?;
        state.serialize_field("target", &self.target)?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}

/// Result of uploading a folder.
#[derive(Debug, Default, Serialize)]
pub struct UploadReport {
    pub prefix: String,
    /// Public URLs in local enumeration order, failed files omitted.
    pub urls: Vec<String>,
    pub bytes: u64,
    /// Sub-directories that were not uploaded.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<TransferFailure>,
}

impl UploadReport {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// True when every enumerated file was uploaded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_targets(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.target.clone()).collect()
    }
}

/// Result of downloading a folder.
#[derive(Debug, Default, Serialize)]
pub struct DownloadReport {
    pub prefix: String,
    pub destination: PathBuf,
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
    /// Keys that map to no local name (a file object equal to the prefix).
    pub skipped: Vec<String>,
    pub failures: Vec<TransferFailure>,
}

impl DownloadReport {
    pub fn new(prefix: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_targets(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.target.clone()).collect()
    }
}
