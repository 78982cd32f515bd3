use std::env;
use std::str::FromStr;

use crate::error::{Error, InvalidConfigSnafu, MissingEnvVarSnafu, Result};
use crate::storage::constants::{DEFAULT_FS_ROOT, DEFAULT_MINIO_ENDPOINT, DEFAULT_REGION};
use crate::storage::{StorageConfig, StorageProvider};
use snafu::OptionExt;

/// Load storage configuration from environment variables
pub fn load_storage_config() -> Result<StorageConfig> {
    load_storage_config_from(|key| env::var(key).ok())
}

/// Load storage configuration through an arbitrary variable lookup.
///
/// Empty values count as missing.
pub fn load_storage_config_from<F>(lookup: F) -> Result<StorageConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvLookup { lookup };
    let provider_str = env.optional(&["STORAGE_PROVIDER"]).unwrap_or_else(|| "s3".to_string());
    let provider = StorageProvider::from_str(&provider_str)?;

    let mut config = match provider {
        StorageProvider::S3 => load_s3_config(&env, &provider_str)?,
        StorageProvider::Fs => load_fs_config(&env),
    };

    if let Some(base) = env.optional(&["STORAGE_PUBLIC_URL_BASE"]) {
        config.public_url_base = Some(base);
    }
    if let Some(retries) = env.optional(&["STORAGE_MAX_RETRIES"]) {
        config.max_retries = parse_value("STORAGE_MAX_RETRIES", &retries)?;
    }

    log::debug!(
        "loaded config provider={:?} bucket={} endpoint={:?} region={:?}",
        config.provider,
        config.bucket,
        config.endpoint,
        config.region
    );
    Ok(config)
}

struct EnvLookup<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvLookup<F> {
    // First non-empty value among `keys`.
    fn optional(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| (self.lookup)(*key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    fn required(&self, primary_key: &str, secondary_key: &str) -> Result<String> {
        self.optional(&[primary_key, secondary_key])
            .context(MissingEnvVarSnafu {
                key: format!("{primary_key} or {secondary_key}"),
            })
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        InvalidConfigSnafu {
            key: key.to_string(),
            value: value.to_string(),
        }
        .build()
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Load S3-compatible configuration (AWS, DigitalOcean Spaces, MinIO)
fn load_s3_config<F: Fn(&str) -> Option<String>>(
    env: &EnvLookup<F>,
    provider_str: &str,
) -> Result<StorageConfig> {
    let flavor = provider_str.to_lowercase();
    let is_minio = flavor == "minio";
    let is_spaces = flavor == "spaces" || flavor == "do";

    let bucket = env.required("STORAGE_BUCKET", "SPACE_NAME")?;
    let access_key_id = env.required("STORAGE_ACCESS_KEY_ID", "DO_ACCESS_KEY_ID")?;
    let secret_access_key = env.required("STORAGE_ACCESS_KEY_SECRET", "DO_SECRET_ACCESS_KEY")?;

    let region = env
        .optional(&["STORAGE_REGION", "AWS_DEFAULT_REGION"])
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let endpoint = if is_spaces {
        Some(env.required("STORAGE_ENDPOINT", "DO_ENDPOINT")?)
    } else if is_minio {
        Some(
            env.optional(&["STORAGE_ENDPOINT", "DO_ENDPOINT"])
                .unwrap_or_else(|| DEFAULT_MINIO_ENDPOINT.to_string()),
        )
    } else {
        env.optional(&["STORAGE_ENDPOINT", "DO_ENDPOINT"])
    };

    let mut config = StorageConfig::s3(bucket, access_key_id, secret_access_key, Some(region));
    config.endpoint = endpoint;
    config.virtual_host_style = match env.optional(&["STORAGE_VIRTUAL_HOST_STYLE"]) {
        Some(value) => parse_bool("STORAGE_VIRTUAL_HOST_STYLE", &value)?,
        None => !is_minio,
    };
    Ok(config)
}

/// Load filesystem configuration (for testing)
fn load_fs_config<F: Fn(&str) -> Option<String>>(env: &EnvLookup<F>) -> StorageConfig {
    let root_path = env
        .optional(&["STORAGE_ROOT_PATH"])
        .unwrap_or_else(|| DEFAULT_FS_ROOT.to_string());
    StorageConfig::fs(root_path)
}
