// Translation between local relative paths and remote object keys.
use crate::error::{MalformedKeySnafu, Result};
use snafu::ensure;
use std::path::{Path, PathBuf};

/// Separator used inside object keys, independent of the local platform.
pub const KEY_SEPARATOR: char = '/';

/// Strip leading and trailing separators so `"/photos"`, `"photos/"` and
/// `"photos"` name the same folder. Stored keys never start with '/'.
pub fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_matches(KEY_SEPARATOR)
}

/// Build the key of a file uploaded into `destination_prefix`.
///
/// `file_name` is a single path segment; uploads are one level deep.
pub fn to_remote_key(destination_prefix: &str, file_name: &str) -> String {
    let prefix = normalize_prefix(destination_prefix);
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{prefix}{KEY_SEPARATOR}{file_name}")
    }
}

/// Key of the zero-length object that marks `prefix` as a folder.
pub fn directory_marker_key(prefix: &str) -> String {
    ensure_trailing_slash(normalize_prefix(prefix))
}

/// Return a new String that guarantees a trailing '/'.
pub fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with(KEY_SEPARATOR) {
        path.to_string()
    } else {
        format!("{path}{KEY_SEPARATOR}")
    }
}

/// Whether `object_key` is a directory marker rather than a file object.
pub fn is_directory_marker(object_key: &str) -> bool {
    object_key.ends_with(KEY_SEPARATOR)
}

/// Strip `source_prefix` and exactly one separator from `object_key`.
///
/// The key of the prefix itself (with or without the trailing separator)
/// yields an empty relative path. Keys outside the prefix, keys with a
/// doubled separator and keys with `.`/`..` segments are `MalformedKey`.
pub fn to_local_relative_path(source_prefix: &str, object_key: &str) -> Result<String> {
    let prefix = normalize_prefix(source_prefix);
    let malformed = || MalformedKeySnafu {
        key: object_key.to_string(),
        prefix: source_prefix.to_string(),
    };

    let remainder = object_key.strip_prefix(prefix).ok_or_else(|| malformed().build())?;
    if remainder.is_empty() {
        return Ok(String::new());
    }

    let relative = if prefix.is_empty() {
        remainder
    } else {
        remainder
            .strip_prefix(KEY_SEPARATOR)
            .ok_or_else(|| malformed().build())?
    };

    if relative.is_empty() {
        return Ok(String::new());
    }

    let segments = relative.strip_suffix(KEY_SEPARATOR).unwrap_or(relative);
    ensure!(
        segments
            .split(KEY_SEPARATOR)
            .all(|segment| !segment.is_empty() && segment != "." && segment != ".."),
        malformed()
    );

    Ok(relative.to_string())
}

/// Join a `/`-separated relative path onto a local root.
pub fn to_local_path(root: &Path, relative: &str) -> PathBuf {
    relative
        .split(KEY_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Extract the file name of a local path as UTF-8, if it has one.
pub fn utf8_file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}
