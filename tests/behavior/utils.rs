use assert_cmd::prelude::*;
use libtest_mimic::{Failed, Trial};
use opendal::Operator;
use rand::Rng;
use rand::prelude::*;
use spacesync::error::Result;
use spacesync::storage::{StorageClient, StorageConfig, StorageProvider};
use std::env;
use std::path::{Path, PathBuf};
use assert_cmd::Command;
use std::sync::LazyLock;
use uuid::Uuid;

const TEST_DEFAULT_BUCKET: &str = "test";
const TEST_DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9000";
const TEST_DEFAULT_ACCESS_KEY_ID: &str = "minioadmin";
const TEST_DEFAULT_ACCESS_KEY_SECRET: &str = "minioadmin";
const TEST_DEFAULT_REGION: &str = "us-east-1";

pub static TEST_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
});

// Runs against MinIO when STORAGE_PROVIDER=minio, otherwise against a
// throwaway local directory through the fs provider.
static TEST_CONFIG: LazyLock<StorageConfig> =
    LazyLock::new(|| build_config_from_env().expect("test storage config"));

pub async fn init_test_service() -> Result<StorageClient> {
    let client = StorageClient::new(TEST_CONFIG.clone()).await?;
    ensure_bucket_exists(client.operator()).await?;
    Ok(client)
}

fn build_config_from_env() -> Result<StorageConfig> {
    let provider = env::var("STORAGE_PROVIDER").unwrap_or_default();
    if !provider.eq_ignore_ascii_case("minio") {
        let root = env::temp_dir().join(format!("spacesync-behavior-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root)?;
        return Ok(StorageConfig::fs(root.to_string_lossy().to_string()));
    }

    let bucket = env::var("STORAGE_BUCKET").unwrap_or_else(|_| TEST_DEFAULT_BUCKET.to_string());
    let access_key_id = env::var("STORAGE_ACCESS_KEY_ID")
        .unwrap_or_else(|_| TEST_DEFAULT_ACCESS_KEY_ID.to_string());
    let access_key_secret = env::var("STORAGE_ACCESS_KEY_SECRET")
        .unwrap_or_else(|_| TEST_DEFAULT_ACCESS_KEY_SECRET.to_string());
    let region = env::var("STORAGE_REGION")
        .ok()
        .unwrap_or_else(|| TEST_DEFAULT_REGION.to_string());
    let endpoint = env::var("STORAGE_ENDPOINT")
        .ok()
        .unwrap_or_else(|| TEST_DEFAULT_ENDPOINT.to_string());

    let mut config = StorageConfig::s3(bucket, access_key_id, access_key_secret, Some(region));
    config.endpoint = Some(endpoint);
    config.virtual_host_style = false;

    Ok(config)
}

/// Apply the test backend config to a command as environment variables
fn apply_storage_env<'a>(cmd: &'a mut Command, cfg: &StorageConfig) -> &'a mut Command {
    match cfg.provider {
        StorageProvider::Fs => cmd
            .env("STORAGE_PROVIDER", "fs")
            .env("STORAGE_ROOT_PATH", cfg.root_path.as_deref().unwrap_or_default()),
        StorageProvider::S3 => cmd
            .env("STORAGE_PROVIDER", "minio")
            .env("STORAGE_BUCKET", &cfg.bucket)
            .env(
                "STORAGE_ENDPOINT",
                cfg.endpoint.as_deref().unwrap_or(TEST_DEFAULT_ENDPOINT),
            )
            .env(
                "STORAGE_ACCESS_KEY_ID",
                cfg.access_key_id
                    .as_deref()
                    .unwrap_or(TEST_DEFAULT_ACCESS_KEY_ID),
            )
            .env(
                "STORAGE_ACCESS_KEY_SECRET",
                cfg.access_key_secret
                    .as_deref()
                    .unwrap_or(TEST_DEFAULT_ACCESS_KEY_SECRET),
            )
            .env(
                "STORAGE_REGION",
                cfg.region.as_deref().unwrap_or(TEST_DEFAULT_REGION),
            ),
    }
}

/// Create a base spacesync Command with clean environment and logging configured
fn base_cmd() -> Command {
    let mut cmd = Command::cargo_bin("spacesync").unwrap();
    cmd.env_clear().env("RUST_LOG", "info");
    cmd
}

/// Ensure the target bucket exists for tests. Ignores 'already exists' errors.
pub async fn ensure_bucket_exists(op: &Operator) -> Result<()> {
    match op.create_dir("/").await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == opendal::ErrorKind::Unexpected => Ok(()),
        Err(e) => Err(spacesync::error::Error::from(e)),
    }
}

/// Create a local directory with the given files and empty sub-directories.
pub fn local_tree(files: &[(&str, &[u8])], dirs: &[&str]) -> PathBuf {
    let root = env::temp_dir().join(format!("spacesync-local-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&root).unwrap();
    for (name, content) in files {
        std::fs::write(root.join(name), content).unwrap();
    }
    for dir in dirs {
        std::fs::create_dir_all(root.join(dir)).unwrap();
    }
    root
}

/// A fresh, not yet existing local directory path.
pub fn fresh_local_dir(label: &str) -> PathBuf {
    env::temp_dir().join(format!("spacesync-{label}-{}", Uuid::new_v4()))
}

pub fn read_local(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

pub struct Fixture {
    pub paths: std::sync::Mutex<Vec<String>>,
}

impl Fixture {
    pub const fn new() -> Self {
        Self {
            paths: std::sync::Mutex::new(vec![]),
        }
    }

    /// A unique remote folder that is removed after the run.
    pub fn new_prefix(&self) -> String {
        let prefix = format!("spacesync-{}", Uuid::new_v4());
        self.paths.lock().unwrap().push(format!("{prefix}/"));
        prefix
    }

    pub fn random_content(&self, range: std::ops::Range<usize>) -> Vec<u8> {
        let mut rng = rand::rng();
        let size = rng.random_range(range);
        let mut content = vec![0; size];
        rng.fill_bytes(&mut content);
        content
    }

    pub async fn cleanup(&self, op: &Operator) {
        let paths: Vec<_> = std::mem::take(self.paths.lock().unwrap().as_mut());
        for path in paths {
            let _ = op.remove_all(&path).await;
        }
        if let Some(root) = &TEST_CONFIG.root_path {
            let _ = std::fs::remove_dir_all(root);
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_async_trial<F, Fut>(name: &str, client: &StorageClient, f: F) -> Trial
where
    F: FnOnce(StorageClient) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<()>> + Send,
{
    let handle = TEST_RUNTIME.handle().clone();
    let client = client.clone();

    Trial::test(format!("behavior::{name}"), move || {
        handle
            .block_on(f(client))
            .map_err(|err| Failed::from(err.to_string()))
    })
}

#[macro_export]
macro_rules! async_trials {
    ($client:ident, $($test:ident),*) => {
        vec![$(build_async_trial(stringify!($test), $client, $test),)*]
    };
}

pub static TEST_FIXTURE: Fixture = Fixture::new();

pub fn spacesync_cmd() -> Command {
    let mut cmd = base_cmd();
    apply_storage_env(&mut cmd, &TEST_CONFIG);
    cmd
}
