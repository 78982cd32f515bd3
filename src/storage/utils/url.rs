// Public URL derivation for objects written with public-read visibility.
use crate::storage::utils::path::KEY_SEPARATOR;

/// Builds the public URL of an object from a fixed base.
///
/// The base is either a configured CDN/custom domain or the bucket endpoint in
/// virtual-host (`https://bucket.host`) or path (`https://host/bucket`) style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlBuilder {
    base_url: String,
}

impl PublicUrlBuilder {
    /// Create a builder from a base URL; a trailing '/' is ignored.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL for a bucket served by an S3-compatible endpoint.
    ///
    /// Example: `https://nyc3.digitaloceanspaces.com` + `media` in virtual-host
    /// style gives `https://media.nyc3.digitaloceanspaces.com`.
    #[must_use]
    pub fn for_endpoint(endpoint: &str, bucket: &str, virtual_host_style: bool) -> Self {
        let endpoint = with_scheme(endpoint);
        let (scheme, host) = endpoint
            .split_once("://")
            .unwrap_or(("https", endpoint.as_str()));
        let host = host.trim_end_matches('/');

        if virtual_host_style {
            Self::new(&format!("{scheme}://{bucket}.{host}"))
        } else {
            Self::new(&format!("{scheme}://{host}/{bucket}"))
        }
    }

    /// Public URL of `key`, with every key segment percent-encoded.
    #[must_use]
    pub fn url(&self, key: &str) -> String {
        let encoded = key
            .split(KEY_SEPARATOR)
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{encoded}", self.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Prefix a bare host with `https://`.
pub fn with_scheme(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}
