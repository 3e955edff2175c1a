//! Turns scanner candidates into hashes and path references, with caching.
//!
//! Directory units are memoized through an [`MtimeCache`] keyed by the directory
//! path, so an unchanged directory is never re-read. Archive units are memoized
//! per `(archive, internal folder)` without any staleness check: archives are not
//! expected to change while the process runs.

use crate::cache::MtimeCache;
use crate::container::{open_container, ContainerKind, DirContainer};
use crate::error::{Error, Result};
use crate::hashing::read_unit_meta;
use crate::model::{Manifest, PathRef, UnitMeta};
use crate::scanner::Candidate;
use crate::utils::relative_to;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;

/// A hashed mod unit and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    pub hash: String,
    pub location: PathRef,
    pub manifest: Option<Manifest>,
}

/// Hash computer front end owning the per-engine caches.
#[derive(Default)]
pub struct MetaResolver {
    folders: MtimeCache<Utf8PathBuf, UnitMeta>,
    archives: HashMap<(Utf8PathBuf, String), UnitMeta>,
}

impl MetaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash and manifest of a candidate.
    pub fn unit_meta(&mut self, candidate: &Candidate) -> Result<UnitMeta> {
        match candidate {
            Candidate::Directory { path } => self.folders.get_or_compute(path, path.clone(), || {
                tracing::debug!("Hashing directory unit {}", path);
                read_unit_meta(&mut DirContainer::new(path.clone()), "")
            }),
            Candidate::Archive {
                archive_path,
                internal_folder,
            } => {
                let key = (archive_path.clone(), internal_folder.clone());
                if let Some(meta) = self.archives.get(&key) {
                    return Ok(meta.clone());
                }

                let kind = ContainerKind::from_file_name(archive_path.as_str())
                    .ok_or_else(|| Error::UnsupportedFileType(archive_path.clone()))?;
                tracing::debug!("Hashing archive unit {}:{}", archive_path, internal_folder);
                let mut container = open_container(archive_path, kind)?;
                let meta = read_unit_meta(container.as_mut(), internal_folder)?;
                self.archives.insert(key, meta.clone());
                Ok(meta)
            }
        }
    }

    /// Hash a candidate and express its location relative to `resource_group`.
    pub fn resolve(
        &mut self,
        candidate: &Candidate,
        resource_group: &Utf8Path,
    ) -> Result<ResolvedUnit> {
        let meta = self.unit_meta(candidate)?;
        let location = PathRef::new(
            resource_group.as_str(),
            relative_to(candidate.container_path(), resource_group),
            candidate.subpath(),
        );
        Ok(ResolvedUnit {
            hash: meta.hash,
            location,
            manifest: meta.manifest,
        })
    }
}
