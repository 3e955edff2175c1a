//! Value types shared by the indices.

use crate::utils::normalize_separators;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Locator of one mod unit inside a resource folder.
///
/// Separators are normalized to `/` on construction and on deserialization, so two
/// references to the same unit compare equal regardless of the platform that
/// recorded them.
///
/// # JSON format
///
/// ```json
/// { "resourceGroup": "/home/me/mods", "path": "pack.zip", "subpath": "skins" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPathRef")]
pub struct PathRef {
    /// Absolute path of the resource folder the unit was found under.
    #[serde(rename = "resourceGroup")]
    pub resource_group: String,
    /// Container (directory or archive) relative to `resource_group`.
    pub path: String,
    /// Folder inside an archive container, empty otherwise.
    pub subpath: String,
}

#[derive(Deserialize)]
struct RawPathRef {
    #[serde(rename = "resourceGroup")]
    resource_group: String,
    path: String,
    #[serde(default)]
    subpath: String,
}

impl From<RawPathRef> for PathRef {
    fn from(raw: RawPathRef) -> Self {
        PathRef::new(raw.resource_group, raw.path, raw.subpath)
    }
}

impl PathRef {
    pub fn new(
        resource_group: impl AsRef<str>,
        path: impl AsRef<str>,
        subpath: impl AsRef<str>,
    ) -> Self {
        Self {
            resource_group: normalize_separators(resource_group.as_ref()),
            path: normalize_separators(path.as_ref()),
            subpath: normalize_separators(subpath.as_ref()),
        }
    }

    /// Human readable name used when a unit has no manifest.
    ///
    /// Prefers the last component of the internal folder, then the container stem,
    /// then the resource folder name.
    pub fn display_name(&self) -> String {
        let from_subpath = self
            .subpath
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty());
        if let Some(name) = from_subpath {
            return name.to_string();
        }

        let stem = Utf8Path::new(&self.path)
            .file_stem()
            .filter(|s| !s.is_empty() && *s != ".");
        if let Some(stem) = stem {
            return stem.to_string();
        }

        Utf8Path::new(&self.resource_group)
            .file_name()
            .unwrap_or(&self.resource_group)
            .to_string()
    }
}

impl fmt::Display for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_group.trim_end_matches('/'), self.path)?;
        if !self.subpath.is_empty() {
            write!(f, ":{}", self.subpath)?;
        }
        Ok(())
    }
}

/// Display metadata read from a unit's `manifest.json`.
///
/// Both lowercase and capitalized keys are accepted; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Description")]
    pub description: String,
}

/// Hash and optional manifest computed for one mod unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMeta {
    /// Lowercase hex SHA-256 over target and sidecar bytes.
    pub hash: String,
    pub manifest: Option<Manifest>,
}
