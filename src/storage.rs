use crate::error::{Error, MissingArgumentSnafu, Result};
use opendal::Operator;
use opendal::layers::{LoggingLayer, RetryLayer};
use snafu::ensure;
use std::path::Path;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

pub mod adapter;
pub mod constants;
pub mod operations;
pub mod utils;

use self::adapter::OpenDalStore;
use self::constants::{DEFAULT_FS_ROOT, DEFAULT_MAX_RETRIES, DEFAULT_REGION};
use self::operations::{
    DownloadReport, Downloader, FolderDownloader, FolderUploader, SyncOptions, UploadReport,
    Uploader,
};
use self::utils::path::normalize_prefix;
use self::utils::url::{PublicUrlBuilder, with_scheme};

/// Storage provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    /// Any S3-compatible service: AWS S3, DigitalOcean Spaces, MinIO
    S3,
    /// Local directory standing in for a bucket
    Fs,
}

impl FromStr for StorageProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "s3" | "aws" | "minio" | "spaces" | "do" => Ok(Self::S3),
            "fs" => Ok(Self::Fs),
            _ => Err(Error::UnsupportedProvider {
                provider: s.to_string(),
            }),
        }
    }
}

/// Unified storage configuration for different providers
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub root_path: Option<String>,
    /// Address objects as `bucket.host` rather than `host/bucket`.
    pub virtual_host_style: bool,
    /// Overrides the derived public URL base (CDN or custom domain).
    pub public_url_base: Option<String>,
    pub max_retries: usize,
}

impl StorageConfig {
    pub fn s3(
        bucket: String,
        access_key_id: String,
        secret_access_key: String,
        region: Option<String>,
    ) -> Self {
        Self {
            provider: StorageProvider::S3,
            bucket,
            access_key_id: Some(access_key_id),
            access_key_secret: Some(secret_access_key),
            endpoint: None,
            region,
            root_path: None,
            virtual_host_style: true,
            public_url_base: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn fs(root_path: String) -> Self {
        Self {
            provider: StorageProvider::Fs,
            bucket: "local".to_string(),
            access_key_id: None,
            access_key_secret: None,
            endpoint: None,
            region: None,
            root_path: Some(root_path),
            virtual_host_style: false,
            public_url_base: None,
            max_retries: 0,
        }
    }

    /// Base every public URL of this bucket starts with.
    pub fn public_url_builder(&self) -> Result<PublicUrlBuilder> {
        if let Some(base) = &self.public_url_base {
            return Ok(PublicUrlBuilder::new(base));
        }

        match self.provider {
            StorageProvider::S3 => {
                let endpoint = self.endpoint.clone().unwrap_or_else(|| {
                    let region = self.region.as_deref().unwrap_or(DEFAULT_REGION);
                    format!("https://s3.{region}.amazonaws.com")
                });
                Ok(PublicUrlBuilder::for_endpoint(
                    &endpoint,
                    &self.bucket,
                    self.virtual_host_style,
                ))
            }
            StorageProvider::Fs => {
                let root = self.root_path.as_deref().unwrap_or(DEFAULT_FS_ROOT);
                let root = std::path::absolute(root)?;
                Ok(PublicUrlBuilder::new(&format!("file://{}", root.display())))
            }
        }
    }
}

/// Unified storage client using OpenDAL
#[derive(Clone)]
pub struct StorageClient {
    store: OpenDalStore,
    provider: StorageProvider,
}

impl StorageClient {
    pub async fn new(config: StorageConfig) -> Result<Self> {
        let operator = Self::build_operator(&config)?;
        let public_urls = config.public_url_builder()?;
        Ok(Self::from_operator(config.provider, operator, public_urls))
    }

    /// Wrap an already-built operator, e.g. an in-memory one.
    pub fn from_operator(
        provider: StorageProvider,
        operator: Operator,
        public_urls: PublicUrlBuilder,
    ) -> Self {
        Self {
            store: OpenDalStore::new(operator, public_urls),
            provider,
        }
    }

    pub fn provider(&self) -> StorageProvider {
        self.provider
    }

    pub fn operator(&self) -> &Operator {
        self.store.operator()
    }

    pub fn store(&self) -> &OpenDalStore {
        &self.store
    }

    fn build_operator(config: &StorageConfig) -> Result<Operator> {
        let operator = match &config.provider {
            StorageProvider::S3 => {
                #[cfg(feature = "s3")]
                {
                    let mut builder = opendal::services::S3::default().bucket(&config.bucket);
                    if let Some(access_key_id) = &config.access_key_id {
                        builder = builder.access_key_id(access_key_id);
                    }
                    if let Some(secret_access_key) = &config.access_key_secret {
                        builder = builder.secret_access_key(secret_access_key);
                    }
                    if let Some(region) = &config.region {
                        builder = builder.region(region);
                    }
                    if let Some(endpoint) = &config.endpoint {
                        builder = builder.endpoint(&with_scheme(endpoint));
                    }
                    if config.virtual_host_style {
                        builder = builder.enable_virtual_host_style();
                    }
                    Operator::new(builder)?
                        .layer(LoggingLayer::default())
                        .finish()
                }

                #[cfg(not(feature = "s3"))]
                {
                    return Err(Error::UnsupportedProvider {
                        provider: "s3 (feature disabled)".to_string(),
                    });
                }
            }
            StorageProvider::Fs => {
                #[cfg(feature = "fs")]
                {
                    let root = config.root_path.as_deref().unwrap_or(DEFAULT_FS_ROOT);
                    let builder = opendal::services::Fs::default().root(root);
                    Operator::new(builder)?
                        .layer(LoggingLayer::default())
                        .finish()
                }

                #[cfg(not(feature = "fs"))]
                {
                    return Err(Error::UnsupportedProvider {
                        provider: "fs (feature disabled)".to_string(),
                    });
                }
            }
        };

        if config.max_retries > 0 {
            Ok(operator.layer(RetryLayer::new().with_max_times(config.max_retries)))
        } else {
            Ok(operator)
        }
    }

    pub async fn upload_folder(
        &self,
        local_path: &Path,
        remote_prefix: &str,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> Result<UploadReport> {
        log::debug!(
            "upload_folder provider={:?} local_path={} remote_prefix={} concurrency={}",
            self.provider,
            local_path.display(),
            remote_prefix,
            options.concurrency
        );
        ensure!(
            !normalize_prefix(remote_prefix).is_empty(),
            MissingArgumentSnafu {
                name: "destination folder path"
            }
        );
        let uploader = FolderUploader::new(&self.store, *options);
        uploader
            .upload_folder(local_path, remote_prefix, cancel)
            .await
    }

    pub async fn download_folder(
        &self,
        remote_prefix: &str,
        local_path: &Path,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport> {
        log::debug!(
            "download_folder provider={:?} remote_prefix={} local_path={} concurrency={} policy={:?}",
            self.provider,
            remote_prefix,
            local_path.display(),
            options.concurrency,
            options.failure_policy
        );
        ensure!(
            !normalize_prefix(remote_prefix).is_empty(),
            MissingArgumentSnafu {
                name: "source folder path"
            }
        );
        let downloader = FolderDownloader::new(&self.store, *options);
        downloader
            .download_folder(remote_prefix, local_path, cancel)
            .await
    }
}
