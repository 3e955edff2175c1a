//! The three persisted hash indices.
//!
//! - [`ResourceIndex`]: hash → every location the unit was found at.
//! - [`InstallIndex`]: hash → installed file name in the game data directory.
//! - [`ManifestCache`]: hash → display metadata.
//!
//! All three are flat JSON objects keyed by hash. A missing file loads as an empty
//! index; a present but malformed one is an error.

use crate::error::Result;
use crate::model::{Manifest, PathRef};
use camino::Utf8Path;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn load_json<T: DeserializeOwned + Default>(path: &Utf8Path) -> Result<T> {
    if !path.as_std_path().exists() {
        return Ok(T::default());
    }

    let contents = std::fs::read_to_string(path.as_std_path())?;
    Ok(serde_json::from_str(&contents)?)
}

fn save_json<T: Serialize>(path: &Utf8Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }
    }

    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path.as_std_path(), contents)?;
    Ok(())
}

/// Hash → ordered, duplicate-free list of locations.
///
/// # JSON format
///
/// ```json
/// {
///   "3f1c…": [
///     { "resourceGroup": "/home/me/mods", "path": "pack.zip", "subpath": "skins" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceIndex {
    entries: BTreeMap<String, Vec<PathRef>>,
}

impl ResourceIndex {
    pub fn load(path: &Utf8Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        save_json(path, self)
    }

    /// Append `location` to `hash`. Returns `false` if it was already recorded.
    pub fn insert(&mut self, hash: &str, location: PathRef) -> bool {
        let locations = self.entries.entry(hash.to_string()).or_default();
        if locations.contains(&location) {
            return false;
        }
        locations.push(location);
        true
    }

    pub fn contains(&self, hash: &str, location: &PathRef) -> bool {
        self.locations(hash).contains(location)
    }

    /// Locations recorded for `hash`, in insertion order.
    pub fn locations(&self, hash: &str) -> &[PathRef] {
        self.entries.get(hash).map(Vec::as_slice).unwrap_or_default()
    }

    /// Remove every location under `resource_group`, dropping hashes left empty.
    ///
    /// Returns the number of locations removed.
    pub fn prune_group(&mut self, resource_group: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, locations| {
            let before = locations.len();
            locations.retain(|l| l.resource_group != resource_group);
            removed += before - locations.len();
            !locations.is_empty()
        });
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathRef])> {
        self.entries.iter().map(|(h, l)| (h.as_str(), l.as_slice()))
    }

    /// Number of distinct hashes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hash → installed file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallIndex {
    entries: BTreeMap<String, String>,
}

impl InstallIndex {
    pub fn load(path: &Utf8Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        save_json(path, self)
    }

    pub fn get(&self, hash: &str) -> Option<&str> {
        self.entries.get(hash).map(String::as_str)
    }

    /// Record `file` under `hash`, returning the file already recorded there instead
    /// if there is one.
    pub fn try_insert(&mut self, hash: &str, file: &str) -> std::result::Result<(), &str> {
        if self.entries.contains_key(hash) {
            return Err(self.entries[hash].as_str());
        }
        self.entries.insert(hash.to_string(), file.to_string());
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(h, f)| (h.as_str(), f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hash → manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestCache {
    entries: BTreeMap<String, Manifest>,
}

impl ManifestCache {
    pub fn load(path: &Utf8Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        save_json(path, self)
    }

    pub fn get(&self, hash: &str) -> Option<&Manifest> {
        self.entries.get(hash)
    }

    pub fn insert(&mut self, hash: &str, manifest: Manifest) {
        self.entries.insert(hash.to_string(), manifest);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
