//! Building the install index from the game data directory.

use crate::container::{Container, DirContainer};
use crate::error::{Error, Result};
use crate::hashing::hash_target;
use crate::index::InstallIndex;
use crate::scanner::PATCH_MARKER;
use camino::Utf8Path;

/// Whether a data directory file name is an installed patch file.
///
/// Both the name and its extension must carry the patch marker, which excludes the
/// `.gpu_resources` and `.stream` sidecars.
pub fn is_installed_patch(name: &str) -> bool {
    name.contains(PATCH_MARKER)
        && Utf8Path::new(name)
            .extension()
            .is_some_and(|ext| ext.contains(PATCH_MARKER))
}

/// Hash every installed patch file directly inside `data_dir`.
///
/// Fails with [`Error::InstallConflict`] as soon as two files share a hash. The
/// returned index is complete; callers swap it in only on success.
pub fn build_install_index(data_dir: &Utf8Path) -> Result<InstallIndex> {
    let mut container = DirContainer::new(data_dir.to_path_buf());
    let entries = container.list_entries()?;
    let present: Vec<&str> = entries
        .iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.name.as_str())
        .collect();

    let mut index = InstallIndex::default();
    for &file in present.iter().filter(|n| is_installed_patch(n)) {
        let hash = hash_target(&mut container, file, &present)?;
        tracing::debug!("Installed {} -> {}", file, hash);
        if let Err(existing) = index.try_insert(&hash, file) {
            return Err(Error::InstallConflict {
                hash,
                file: file.to_string(),
                existing: existing.to_string(),
            });
        }
    }

    tracing::info!("Indexed {} installed mods in {}", index.len(), data_dir);
    Ok(index)
}
