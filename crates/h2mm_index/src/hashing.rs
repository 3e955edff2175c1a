//! Content hashing of mod units.
//!
//! The content hash is a SHA-256 digest over, in this exact order:
//!
//! 1. the target file,
//! 2. `<target>.gpu_resources`, if present,
//! 3. `<target>.stream`, if present.
//!
//! All parts feed one running digest in 8 KiB chunks. The hash depends only on
//! bytes and order, so the same unit hashes identically from a directory, a zip
//! or a rar archive. Reordering the parts changes the hash.

use crate::container::Container;
use crate::error::{Error, Result};
use crate::model::{Manifest, UnitMeta};
use crate::scanner::{folder_files, select_target};
use sha2::{Digest, Sha256};
use std::io::Read;

/// Read size used while hashing.
pub const CHUNK_SIZE: usize = 8192;

/// Sidecar suffixes in hashing order.
pub const SIDECAR_SUFFIXES: [&str; 2] = [".gpu_resources", ".stream"];

/// File holding a unit's display metadata.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Feed every reader into one SHA-256 digest and return it as lowercase hex.
#[cfg(test)]
pub(crate) fn digest_parts<R: Read>(parts: impl IntoIterator<Item = R>) -> Result<String> {
    let mut hasher = Sha256::new();
    for part in parts {
        feed(&mut hasher, part)?;
    }
    Ok(hex::encode(hasher.finalize()))
}

fn feed(hasher: &mut Sha256, mut reader: impl Read) -> Result<()> {
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        hasher.update(&buf[..n]);
    }
}

/// Hash the target entry `target` of a container plus whichever sidecars exist.
///
/// `target` and the names in `present` are full entry names within the container.
pub fn hash_target(
    container: &mut dyn Container,
    target: &str,
    present: &[&str],
) -> Result<String> {
    let mut hasher = Sha256::new();
    feed(&mut hasher, container.open_entry(target)?)?;
    for suffix in SIDECAR_SUFFIXES {
        let sidecar = format!("{target}{suffix}");
        if present.contains(&sidecar.as_str()) {
            tracing::trace!("Including sidecar {}", sidecar);
            feed(&mut hasher, container.open_entry(&sidecar)?)?;
        }
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute hash and manifest for the unit in `folder` of a container.
///
/// `folder` is `""` for the container root. The folder must still hold exactly one
/// target; a change since scanning surfaces as [`Error::TargetCount`]. A missing
/// manifest, or one without a name, is fine. One that is not a JSON object is
/// [`Error::Manifest`].
pub fn read_unit_meta(container: &mut dyn Container, folder: &str) -> Result<UnitMeta> {
    let entries = container.list_entries()?;
    let names = folder_files(&entries, folder);
    let location = if folder.is_empty() {
        container.path().to_string()
    } else {
        format!("{}:{}", container.path(), folder)
    };

    let target = select_target(names.iter().copied(), &location)?;
    let full = |name: &str| {
        if folder.is_empty() {
            name.to_string()
        } else {
            format!("{folder}/{name}")
        }
    };

    let present: Vec<String> = names.iter().copied().map(&full).collect();
    let present: Vec<&str> = present.iter().map(String::as_str).collect();
    let hash = hash_target(container, &full(target), &present)?;

    let manifest = if names.contains(&MANIFEST_FILE) {
        let mut raw = String::new();
        container
            .open_entry(&full(MANIFEST_FILE))?
            .read_to_string(&mut raw)?;
        parse_manifest(&raw, &location)?
    } else {
        None
    };

    Ok(UnitMeta { hash, manifest })
}

fn parse_manifest(raw: &str, location: &str) -> Result<Option<Manifest>> {
    let raw = raw.trim_start_matches('\u{feff}');
    let manifest: Manifest = serde_json::from_str(raw).map_err(|source| Error::Manifest {
        location: location.to_string(),
        source,
    })?;
    if manifest.name.is_empty() {
        tracing::debug!("Manifest in {} has no name, ignoring it", location);
        return Ok(None);
    }
    Ok(Some(manifest))
}
