//! Path normalization and filesystem timestamp helpers.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Normalize path separators to forward slashes.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Modification time of `path` as seconds since the Unix epoch.
pub fn mtime(path: &Utf8Path) -> std::io::Result<f64> {
    let modified = std::fs::metadata(path.as_std_path())?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default())
}

/// Convert a std path into a UTF-8 path.
pub fn to_utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(Error::NonUtf8Path)
}

/// Make `path` absolute against the current directory without resolving symlinks.
///
/// Trailing separators and `.` components are dropped, so `mods/` and `mods` give
/// the same result. `..` is kept as is.
pub fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let abs: PathBuf = std::path::absolute(Path::new(path.as_str()))?
        .components()
        .collect();
    to_utf8(abs)
}

/// Relative path from `base` to `path`, `"."` when they are equal.
///
/// `path` is expected to live under `base`; otherwise it is returned unchanged.
pub fn relative_to(path: &Utf8Path, base: &Utf8Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) if rel.as_str().is_empty() => ".".to_string(),
        Ok(rel) => normalize_separators(rel.as_str()),
        Err(_) => normalize_separators(path.as_str()),
    }
}

/// Lowercased extension of a file name, if any.
pub fn extension_lower(name: &str) -> Option<String> {
    Utf8Path::new(name)
        .extension()
        .map(|ext| ext.to_ascii_lowercase())
}
