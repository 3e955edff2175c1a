//! Persisted configuration, stored as TOML.
//!
//! The configuration file is the root of all persisted state: the three JSON
//! indices live next to it (see [`IndexPaths`]).
//!
//! # TOML format
//!
//! ```toml
//! game_path = "/games/Helldivers 2"
//! last_install_check = 1718000000.25
//!
//! [[resources]]
//! path = "/home/me/mods"
//! last_modified = 1718000000.0
//! ```

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Name of the game subdirectory holding installed patch files.
pub const DATA_DIR: &str = "data";

pub const INSTALL_INDEX_FILE: &str = "installIndex.json";
pub const RESOURCE_INDEX_FILE: &str = "modIndex.json";
pub const MANIFEST_CACHE_FILE: &str = "manifestCache.json";

/// One configured resource folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFolder {
    /// Absolute folder path.
    pub path: Utf8PathBuf,
    /// Folder mtime (epoch seconds) at the last scan.
    pub last_modified: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub game_path: Utf8PathBuf,
    #[serde(default)]
    pub resources: Vec<ResourceFolder>,
    /// Data directory mtime (epoch seconds) at the last install index rebuild.
    #[serde(default)]
    pub last_install_check: f64,
}

impl Config {
    pub fn new(game_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            game_path: game_path.into(),
            resources: Vec::new(),
            last_install_check: 0.0,
        }
    }

    /// Load a configuration file.
    ///
    /// Returns [`Error::ConfigNotFound`] if the file doesn't exist.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.as_std_path().exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path.as_std_path())?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save the configuration, creating parent directories if needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent.as_std_path())?;
            }
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }

    /// Write a fresh configuration for `game_path` to `path`.
    ///
    /// An existing file is left untouched and `Ok(None)` returned unless `overwrite`
    /// is set.
    pub fn create(
        path: &Utf8Path,
        game_path: impl Into<Utf8PathBuf>,
        overwrite: bool,
    ) -> Result<Option<Self>> {
        if !overwrite && path.as_std_path().exists() {
            tracing::debug!("Config {} already exists, not overwriting", path);
            return Ok(None);
        }

        let config = Self::new(game_path);
        config.save(path)?;
        tracing::info!("Created config at {}", path);
        Ok(Some(config))
    }

    /// Game directory holding installed patch files.
    pub fn data_dir(&self) -> Utf8PathBuf {
        self.game_path.join(DATA_DIR)
    }

    pub fn resource(&self, path: &Utf8Path) -> Option<&ResourceFolder> {
        self.resources.iter().find(|r| r.path == path)
    }

    pub fn resource_mut(&mut self, path: &Utf8Path) -> Option<&mut ResourceFolder> {
        self.resources.iter_mut().find(|r| r.path == path)
    }
}

/// Locations of the JSON indices belonging to one configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub install: Utf8PathBuf,
    pub resources: Utf8PathBuf,
    pub manifests: Utf8PathBuf,
}

impl IndexPaths {
    /// Index files in the same directory as `config_path`.
    pub fn beside(config_path: &Utf8Path) -> Self {
        let dir = config_path.parent().unwrap_or(Utf8Path::new(""));
        Self {
            install: dir.join(INSTALL_INDEX_FILE),
            resources: dir.join(RESOURCE_INDEX_FILE),
            manifests: dir.join(MANIFEST_CACHE_FILE),
        }
    }
}
