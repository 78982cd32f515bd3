//! Synchronize a local folder with a folder (key prefix) of an S3-compatible bucket.
//!
//! Uploads copy the files directly inside a local directory under a remote
//! prefix and collect their public URLs. Downloads list everything below a
//! prefix and rebuild the directory tree on disk, streaming each body to a
//! file.
pub mod cli;
pub mod config;
pub mod error;
pub mod storage;
pub mod utils;
