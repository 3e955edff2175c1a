//! Discovery of mod units inside resource folders.
//!
//! A **mod unit** is a group of files with exactly one *target file* (no
//! extension, or an extension starting with `patch_`), optional sidecars and an
//! optional `manifest.json`. The scanner never hashes anything; it only reports
//! [`Candidate`] locations for the hash computer.
//!
//! Two traversal modes exist:
//!
//! 1. [`scan_folder`] walks the filesystem recursively. A directory whose loose
//!    files contain exactly one target is a candidate. Subdirectories starting with
//!    `.` or `_` are never entered. Every `.zip`/`.rar` file found is handed to
//!    mode 2.
//! 2. [`scan_archive`] looks at the folders of one archive (explicit directory
//!    records, folders implied by file paths and the archive root) and reports each
//!    folder whose direct children contain exactly one target. Nested archives are
//!    not opened.
//!
//! Folders with zero or several targets are skipped without error.

use crate::container::{open_container, Container, ContainerEntry, ContainerKind};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;

/// Extension prefix reserved for game patch files.
pub const PATCH_MARKER: &str = "patch_";

/// A location that holds exactly one target file at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Candidate {
    /// A filesystem directory.
    Directory { path: Utf8PathBuf },
    /// A folder inside an archive, `""` for the archive root.
    Archive {
        archive_path: Utf8PathBuf,
        internal_folder: String,
    },
}

impl Candidate {
    /// Path of the directory or archive on disk.
    pub fn container_path(&self) -> &Utf8Path {
        match self {
            Candidate::Directory { path } => path,
            Candidate::Archive { archive_path, .. } => archive_path,
        }
    }

    /// Folder inside the container, empty for directories.
    pub fn subpath(&self) -> &str {
        match self {
            Candidate::Directory { .. } => "",
            Candidate::Archive {
                internal_folder, ..
            } => internal_folder,
        }
    }
}

/// Whether `name` (a bare file name) is a target file.
pub fn is_target_file(name: &str) -> bool {
    match Utf8Path::new(name).extension() {
        None => true,
        Some(ext) => ext.starts_with(PATCH_MARKER),
    }
}

/// Return the single target among `names`, or [`Error::TargetCount`].
pub fn select_target<'a, I>(names: I, location: &str) -> Result<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let targets: Vec<&str> = names.into_iter().filter(|n| is_target_file(n)).collect();
    match targets.as_slice() {
        [single] => Ok(*single),
        _ => Err(Error::TargetCount {
            location: location.to_string(),
            count: targets.len(),
        }),
    }
}

/// Recursively collect every candidate under `dir`.
///
/// Corrupt or password-protected archives are logged and skipped. Any other
/// failure aborts the scan.
pub fn scan_folder(dir: &Utf8Path) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    scan_folder_into(dir, &mut candidates)?;
    Ok(candidates)
}

fn scan_folder_into(dir: &Utf8Path, out: &mut Vec<Candidate>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir.as_std_path())? {
        let entry = entry?;
        let path = match Utf8PathBuf::from_path_buf(entry.path()) {
            Ok(p) => p,
            Err(p) => {
                tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                continue;
            }
        };
        entries.push(path);
    }
    entries.sort();

    let mut archives = Vec::new();
    let mut subdirs = Vec::new();
    let mut loose = Vec::new();
    for path in entries {
        let Some(name) = path.file_name() else {
            continue;
        };
        if path.as_std_path().is_dir() {
            subdirs.push(path);
        } else if let Some(kind) = ContainerKind::from_file_name(name) {
            archives.push((path, kind));
        } else {
            loose.push(path);
        }
    }

    let loose_names = loose.iter().filter_map(|p| p.file_name());
    if select_target(loose_names, dir.as_str()).is_ok() {
        tracing::debug!("Found directory mod unit at {}", dir);
        out.push(Candidate::Directory {
            path: dir.to_path_buf(),
        });
    }

    for sub in subdirs {
        let hidden = sub
            .file_name()
            .is_some_and(|n| n.starts_with('.') || n.starts_with('_'));
        if hidden {
            tracing::debug!("Skipping reserved folder {}", sub);
            continue;
        }
        scan_folder_into(&sub, out)?;
    }

    for (archive, kind) in archives {
        let found = open_container(&archive, kind).and_then(|mut c| scan_archive(c.as_mut()));
        match found {
            Ok(found) => out.extend(found),
            Err(e) if e.is_skippable() => {
                tracing::warn!("Skipping archive {}: {}", archive, e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// Collect every internal folder of an archive that forms a mod unit.
pub fn scan_archive(container: &mut dyn Container) -> Result<Vec<Candidate>> {
    let entries = container.list_entries()?;
    let archive_path = container.path().to_path_buf();

    let mut folders: BTreeSet<String> = BTreeSet::new();
    folders.insert(String::new());
    for entry in &entries {
        if entry.is_dir {
            folders.insert(entry.name.clone());
        } else if let Some((parent, _)) = entry.name.rsplit_once('/') {
            folders.insert(parent.to_string());
        }
    }

    let mut candidates = Vec::new();
    for folder in folders {
        let names = folder_files(&entries, &folder);
        if names.is_empty() {
            continue;
        }
        let location = format!("{}:{}", archive_path, folder);
        if select_target(names.iter().copied(), &location).is_ok() {
            tracing::debug!("Found archive mod unit at {}", location);
            candidates.push(Candidate::Archive {
                archive_path: archive_path.clone(),
                internal_folder: folder,
            });
        }
    }
    Ok(candidates)
}

/// Bare names of the files directly inside `folder` (`""` is the root).
pub fn folder_files<'a>(entries: &'a [ContainerEntry], folder: &str) -> Vec<&'a str> {
    entries
        .iter()
        .filter(|e| !e.is_dir)
        .filter_map(|e| match e.name.rsplit_once('/') {
            Some((parent, name)) if parent == folder => Some(name),
            None if folder.is_empty() => Some(e.name.as_str()),
            _ => None,
        })
        .collect()
}
