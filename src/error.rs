use snafu::Snafu;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Environment variable '{key}' is required but not found"))]
    MissingEnvVar { key: String },

    #[snafu(display("Invalid value '{value}' for '{key}'"))]
    InvalidConfig { key: String, value: String },

    #[snafu(display("Unsupported storage provider: {provider}"))]
    UnsupportedProvider { provider: String },

    #[snafu(display("Missing required argument: {name}"))]
    MissingArgument { name: String },

    #[snafu(display("Aborted by user"))]
    Aborted,

    #[snafu(display("Operation cancelled"))]
    Cancelled,

    #[snafu(display("Failed to create remote folder '{prefix}': {source}"))]
    FolderCreationFailed { prefix: String, source: Box<Error> },

    #[snafu(display("Folder does not exist or is not a folder: {}", path.display()))]
    SourceNotFound { path: PathBuf },

    #[snafu(display("File name is not valid UTF-8: {}", path.display()))]
    InvalidFileName { path: PathBuf },

    #[snafu(display("Failed to upload '{}' to '{key}': {source}", local_path.display()))]
    ObjectUploadFailed {
        local_path: PathBuf,
        key: String,
        source: Box<Error>,
    },

    #[snafu(display("Partial upload failure: {} file(s) failed to upload: {}", failed_paths.len(), failed_paths.join(", ")))]
    PartialUpload { failed_paths: Vec<String> },

    #[snafu(display("Failed to list objects under '{prefix}': {source}"))]
    ListingFailed { prefix: String, source: Box<Error> },

    #[snafu(display("Object key '{key}' does not belong to prefix '{prefix}'"))]
    MalformedKey { key: String, prefix: String },

    #[snafu(display("Failed to download '{key}' to '{}': {source}", local_path.display()))]
    ObjectTransferFailed {
        key: String,
        local_path: PathBuf,
        source: Box<Error>,
    },

    #[snafu(display("Partial download failure: {} object(s) failed to download: {}", failed_keys.len(), failed_keys.join(", ")))]
    PartialDownload { failed_keys: Vec<String> },

    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    #[snafu(display("OpenDAL error: {source}"))]
    OpenDal { source: opendal::Error },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },
}

impl From<opendal::Error> for Error {
    fn from(error: opendal::Error) -> Self {
        Error::OpenDal { source: error }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io { source: error }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json { source: error }
    }
}
