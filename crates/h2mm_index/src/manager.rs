//! Top-level owner of the configuration and all indices.
//!
//! [`ModManager::load`] reads the configuration and the persisted indices, then
//! brings them up to date:
//!
//! 1. If the game data directory was modified after `last_install_check`, the
//!    install index is rebuilt from scratch.
//! 2. Every resource folder modified after its recorded `last_modified` is
//!    re-scanned.
//!
//! Every mutating operation persists what it changed before returning. Changes are
//! made to a staged copy of the configuration and indices, which is written out and
//! only then swapped in. A failed pass or a failed write leaves the in-memory state
//! as it was.

use crate::config::{Config, IndexPaths, ResourceFolder};
use crate::container::{open_container, ContainerKind};
use crate::error::{Error, Result};
use crate::index::{InstallIndex, ManifestCache, ResourceIndex};
use crate::install::build_install_index;
use crate::model::{Manifest, PathRef};
use crate::resolver::{MetaResolver, ResolvedUnit};
use crate::scanner::{scan_archive, scan_folder, Candidate};
use crate::utils::{absolute, extension_lower, mtime, normalize_separators, relative_to};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;

/// Identifies a configured resource folder by path or by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderRef {
    Path(Utf8PathBuf),
    Index(usize),
}

impl From<usize> for FolderRef {
    fn from(index: usize) -> Self {
        FolderRef::Index(index)
    }
}

impl From<Utf8PathBuf> for FolderRef {
    fn from(path: Utf8PathBuf) -> Self {
        FolderRef::Path(path)
    }
}

impl From<&Utf8Path> for FolderRef {
    fn from(path: &Utf8Path) -> Self {
        FolderRef::Path(path.to_path_buf())
    }
}

impl FromStr for FolderRef {
    type Err = Infallible;

    /// A plain number is an index, anything else a path.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(index) => FolderRef::Index(index),
            Err(_) => FolderRef::Path(Utf8PathBuf::from(s)),
        })
    }
}

/// Where the name of an installed mod came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    /// The unit's `manifest.json`.
    Manifest,
    /// Derived from a known resource location.
    Resource,
    /// The installed file matches nothing indexed.
    Unknown,
}

/// One row of [`ModManager::list_installed_mods`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledMod {
    pub installed_file: String,
    pub name: String,
    pub description: Option<String>,
    pub source: RowSource,
}

pub struct ModManager {
    config: Config,
    config_path: Utf8PathBuf,
    paths: IndexPaths,
    resources: ResourceIndex,
    installs: InstallIndex,
    manifests: ManifestCache,
    resolver: MetaResolver,
}

impl ModManager {
    /// Load the configuration at `config_path` and open the manager over it.
    pub fn load(config_path: &Utf8Path) -> Result<Self> {
        let config = Config::load(config_path)?;
        Self::open(config, config_path)
    }

    /// Open a manager over an already loaded configuration.
    ///
    /// Index files are looked up next to `config_path`. Stale indices are rebuilt
    /// and persisted before this returns.
    pub fn open(config: Config, config_path: &Utf8Path) -> Result<Self> {
        let paths = IndexPaths::beside(config_path);
        let mut manager = Self {
            config,
            config_path: config_path.to_path_buf(),
            resources: ResourceIndex::load(&paths.resources)?,
            installs: InstallIndex::default(),
            manifests: ManifestCache::load(&paths.manifests)?,
            paths,
            resolver: MetaResolver::new(),
        };

        let data_dir = manager.config.data_dir();
        let data_modified = mtime(&data_dir).map_err(|_| Error::MissingPath(data_dir))?;
        if data_modified > manager.config.last_install_check {
            tracing::info!("Game data changed since last check, rebuilding install index");
            manager.reparse_installed_mods()?;
        } else {
            manager.installs = InstallIndex::load(&manager.paths.install)?;
        }

        let mut stale = Vec::new();
        for record in &manager.config.resources {
            let modified =
                mtime(&record.path).map_err(|_| Error::MissingPath(record.path.clone()))?;
            if modified > record.last_modified {
                stale.push(record.path.clone());
            }
        }
        for path in stale {
            tracing::info!("Resource folder {} changed, re-scanning", path);
            manager.reparse_resource_folder(FolderRef::Path(path))?;
        }

        Ok(manager)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    pub fn resource_folders(&self) -> &[ResourceFolder] {
        &self.config.resources
    }

    pub fn resource_index(&self) -> &ResourceIndex {
        &self.resources
    }

    pub fn install_index(&self) -> &InstallIndex {
        &self.installs
    }

    pub fn manifest_cache(&self) -> &ManifestCache {
        &self.manifests
    }

    /// Rebuild the install index from the game data directory.
    ///
    /// On [`Error::InstallConflict`] the previous index and `last_install_check` are
    /// kept and nothing is written.
    pub fn reparse_installed_mods(&mut self) -> Result<()> {
        let data_dir = self.config.data_dir();
        let checked = mtime(&data_dir).map_err(|_| Error::MissingPath(data_dir.clone()))?;

        let index = build_install_index(&data_dir)?;

        let mut config = self.config.clone();
        config.last_install_check = checked;
        index.save(&self.paths.install)?;
        config.save(&self.config_path)?;
        self.installs = index;
        self.config = config;
        Ok(())
    }

    /// Register a new resource folder and scan it.
    ///
    /// An already registered folder is an error unless `skip_existing` is set, in
    /// which case nothing happens.
    pub fn add_resource_folder(&mut self, path: &Utf8Path, skip_existing: bool) -> Result<()> {
        let meta = std::fs::metadata(path.as_std_path())
            .map_err(|_| Error::MissingPath(path.to_path_buf()))?;
        if !meta.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }

        let path = absolute(path)?;
        if self.config.resource(&path).is_some() {
            if skip_existing {
                tracing::debug!("Resource folder {} already registered", path);
                return Ok(());
            }
            return Err(Error::FolderAlreadyRegistered(path));
        }

        self.config.resources.push(ResourceFolder {
            path: path.clone(),
            last_modified: 0.0,
        });
        if let Err(e) = self.reparse_resource_folder(FolderRef::Path(path)) {
            self.config.resources.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Replace everything recorded for one resource folder with a fresh scan.
    pub fn reparse_resource_folder(&mut self, folder: impl Into<FolderRef>) -> Result<()> {
        let path = self.registered_folder(folder.into())?;
        let modified = mtime(&path).map_err(|_| Error::MissingPath(path.clone()))?;

        tracing::info!("Scanning resource folder {}", path);
        let candidates = scan_folder(&path)?;
        let units = self.stage_units(&candidates, &path)?;

        let mut staged = self.stage();
        let removed = staged.resources.prune_group(&normalize_separators(path.as_str()));
        let added = units.len();
        staged.insert_units(units);
        if let Some(record) = staged.config.resource_mut(&path) {
            record.last_modified = modified;
        }
        self.commit(staged)?;

        tracing::info!(
            "Resource folder {}: {} units found, {} stale locations replaced",
            path,
            added,
            removed
        );
        Ok(())
    }

    /// Drop every location recorded under `path`. Returns how many were removed.
    ///
    /// Manifests are kept. The folder itself stays configured.
    pub fn prune_resource_folder(&mut self, path: &Utf8Path) -> Result<usize> {
        let path = absolute(path)?;
        let path = match self.config.resource(&path) {
            Some(record) => record.path.clone(),
            None => path,
        };
        let mut staged = self.stage();
        let removed = staged.resources.prune_group(&normalize_separators(path.as_str()));
        self.commit(staged)?;
        tracing::info!("Pruned {} locations under {}", removed, path);
        Ok(removed)
    }

    /// Index the mod units at `path`, a directory or archive inside a configured
    /// resource folder. Nothing is copied.
    pub fn register_new_mod(&mut self, path: &Utf8Path) -> Result<()> {
        let path = absolute(path)?;
        if !path.as_std_path().exists() {
            return Err(Error::MissingPath(path));
        }

        let group = self
            .config
            .resources
            .iter()
            .find(|r| path.starts_with(&r.path))
            .map(|r| r.path.clone())
            .ok_or_else(|| Error::NotInResourceFolder(path.clone()))?;

        let candidates = match ContainerKind::detect(&path)? {
            ContainerKind::Directory => scan_folder(&path)?,
            kind => scan_archive(open_container(&path, kind)?.as_mut())?,
        };

        let units = self.stage_units(&candidates, &group)?;
        let added = units.len();
        let mut staged = self.stage();
        staged.insert_units(units);
        self.commit(staged)?;
        tracing::info!("Registered {} units from {}", added, path);
        Ok(())
    }

    /// Copy an archive holding exactly one mod unit into a resource folder, named by
    /// its hash, and index it. Returns the hash.
    ///
    /// `target` defaults to the first configured resource folder.
    pub fn add_resource(&mut self, path: &Utf8Path, target: Option<&Utf8Path>) -> Result<String> {
        let target = match target {
            Some(target) => absolute(target)?,
            None => self
                .config
                .resources
                .first()
                .map(|r| r.path.clone())
                .ok_or(Error::NoResourceFolders)?,
        };
        if !target.as_std_path().is_dir() {
            return Err(Error::MissingPath(target));
        }
        if self.config.resource(&target).is_none() {
            return Err(Error::FolderNotRegistered(target.to_string()));
        }
        if !path.as_std_path().exists() {
            return Err(Error::MissingPath(path.to_path_buf()));
        }

        let kind = ContainerKind::detect(path)?;
        if !kind.is_archive() {
            return Err(Error::UnsupportedFileType(path.to_path_buf()));
        }
        let ext = extension_lower(path.as_str()).unwrap_or_default();

        let candidates = scan_archive(open_container(path, kind)?.as_mut())?;
        let candidate = match candidates.as_slice() {
            [single] => single,
            _ => {
                return Err(Error::TargetCount {
                    location: path.to_string(),
                    count: candidates.len(),
                })
            }
        };
        let meta = self.resolver.unit_meta(candidate)?;

        let dest = target.join(format!("{}.{}", meta.hash, ext));
        let location = PathRef::new(
            target.as_str(),
            relative_to(&dest, &target),
            candidate.subpath(),
        );
        if self.resources.contains(&meta.hash, &location) {
            return Err(Error::DuplicateLocation {
                hash: meta.hash,
                location: location.to_string(),
            });
        }

        std::fs::copy(path.as_std_path(), dest.as_std_path())?;
        tracing::info!("Copied {} to {}", path, dest);

        let mut staged = self.stage();
        staged.insert_units(vec![ResolvedUnit {
            hash: meta.hash.clone(),
            location,
            manifest: meta.manifest,
        }]);
        let modified = mtime(&target)?;
        if let Some(record) = staged.config.resource_mut(&target) {
            record.last_modified = modified;
        }
        self.commit(staged)?;
        Ok(meta.hash)
    }

    /// Installed mods joined with their names, sorted by installed file.
    pub fn list_installed_mods(&self) -> Vec<InstalledMod> {
        let mut rows: Vec<InstalledMod> = self
            .installs
            .iter()
            .map(|(hash, file)| {
                let installed_file = file.to_string();
                if let Some(manifest) = self.manifests.get(hash) {
                    return InstalledMod {
                        installed_file,
                        name: manifest.name.clone(),
                        description: Some(manifest.description.clone()),
                        source: RowSource::Manifest,
                    };
                }
                match self.resources.locations(hash).first() {
                    Some(location) => InstalledMod {
                        installed_file,
                        name: location.display_name(),
                        description: None,
                        source: RowSource::Resource,
                    },
                    None => InstalledMod {
                        installed_file,
                        name: "Unknown".to_string(),
                        description: None,
                        source: RowSource::Unknown,
                    },
                }
            })
            .collect();
        rows.sort_by(|a, b| a.installed_file.cmp(&b.installed_file));
        rows
    }

    fn registered_folder(&self, folder: FolderRef) -> Result<Utf8PathBuf> {
        let path = match folder {
            FolderRef::Index(index) => self
                .config
                .resources
                .get(index)
                .map(|r| r.path.clone())
                .ok_or_else(|| Error::FolderNotRegistered(format!("#{index}")))?,
            FolderRef::Path(path) => absolute(&path)?,
        };
        if !path.as_std_path().exists() {
            return Err(Error::MissingPath(path));
        }
        // The recorded spelling is what every location of this folder carries.
        self.config
            .resource(&path)
            .map(|record| record.path.clone())
            .ok_or_else(|| Error::FolderNotRegistered(path.to_string()))
    }

    /// Hash every candidate, skipping unreadable archives.
    ///
    /// Two locations in one pass with the same hash but different manifests fail the
    /// whole pass with [`Error::HashConflict`]. A unit without manifest never
    /// conflicts.
    fn stage_units(
        &mut self,
        candidates: &[Candidate],
        group: &Utf8Path,
    ) -> Result<Vec<ResolvedUnit>> {
        let mut units = Vec::with_capacity(candidates.len());
        let mut seen: HashMap<String, (Manifest, PathRef)> = HashMap::new();

        for candidate in candidates {
            let unit = match self.resolver.resolve(candidate, group) {
                Ok(unit) => unit,
                Err(e) if e.is_skippable() => {
                    tracing::warn!("Skipping {}: {}", candidate.container_path(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            tracing::debug!("{} -> {}", unit.location, unit.hash);

            if let Some(manifest) = &unit.manifest {
                match seen.entry(unit.hash.clone()) {
                    Entry::Occupied(entry) => {
                        let (first, location) = entry.get();
                        if first != manifest && *location != unit.location {
                            return Err(Error::HashConflict {
                                hash: unit.hash,
                                location: unit.location.to_string(),
                                existing: location.to_string(),
                            });
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert((manifest.clone(), unit.location.clone()));
                    }
                }
            }
            units.push(unit);
        }
        Ok(units)
    }

    fn stage(&self) -> Staged {
        Staged {
            config: self.config.clone(),
            resources: self.resources.clone(),
            manifests: self.manifests.clone(),
        }
    }

    /// Write `staged` to disk, then make it the current state.
    fn commit(&mut self, staged: Staged) -> Result<()> {
        staged.resources.save(&self.paths.resources)?;
        staged.manifests.save(&self.paths.manifests)?;
        staged.config.save(&self.config_path)?;
        self.config = staged.config;
        self.resources = staged.resources;
        self.manifests = staged.manifests;
        Ok(())
    }
}

/// Pending copy of the mutable state of a [`ModManager`].
struct Staged {
    config: Config,
    resources: ResourceIndex,
    manifests: ManifestCache,
}

impl Staged {
    fn insert_units(&mut self, units: Vec<ResolvedUnit>) {
        for unit in units {
            if let Some(manifest) = unit.manifest {
                self.manifests.insert(&unit.hash, manifest);
            }
            self.resources.insert(&unit.hash, unit.location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::DirContainer;
    use crate::hashing::{digest_parts, read_unit_meta};
    use filetime::{set_file_mtime, FileTime};
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::{tempdir, TempDir};
    use zip::write::SimpleFileOptions;

    struct Fixture {
        _dir: TempDir,
        root: Utf8PathBuf,
        config_path: Utf8PathBuf,
        data: Utf8PathBuf,
        mods: Utf8PathBuf,
    }

    fn fixture() -> Fixture {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let data = root.join("game/data");
        let mods = root.join("mods");
        fs::create_dir_all(&data).unwrap();
        fs::create_dir_all(&mods).unwrap();
        let config_path = root.join("state/config.toml");
        Config::create(&config_path, root.join("game"), false).unwrap();
        Fixture {
            _dir: dir,
            root,
            config_path,
            data,
            mods,
        }
    }

    fn write_unit(dir: &Utf8Path, payload: &[u8], manifest: Option<&str>) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("modpayload"), payload).unwrap();
        if let Some(manifest) = manifest {
            fs::write(dir.join("manifest.json"), manifest).unwrap();
        }
    }

    fn write_zip(path: &Utf8Path, files: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, data) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    fn foo_bar() -> Manifest {
        Manifest {
            name: "Foo".into(),
            description: "Bar".into(),
        }
    }

    const FOO_BAR: &str = r#"{"name":"Foo","description":"Bar"}"#;

    #[test]
    fn test_add_folder_with_directory_unit() {
        let fx = fixture();
        write_unit(&fx.mods.join("armor"), b"payload", Some(FOO_BAR));

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();

        let hash = digest_parts([&b"payload"[..]]).unwrap();
        let index = mgr.resource_index();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.locations(&hash),
            &[PathRef::new(fx.mods.as_str(), "armor", "")]
        );
        assert_eq!(mgr.manifest_cache().get(&hash), Some(&foo_bar()));

        // Persisted next to the config.
        let reloaded = ModManager::load(&fx.config_path).unwrap();
        assert_eq!(reloaded.resource_index(), mgr.resource_index());
        assert_eq!(reloaded.resource_folders().len(), 1);
    }

    #[test]
    fn test_add_folder_with_archive_unit() {
        let fx = fixture();
        write_zip(
            &fx.mods.join("pack.zip"),
            &[
                ("skins/modpayload", &b"payload"[..]),
                ("skins/manifest.json", FOO_BAR.as_bytes()),
            ],
        );

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();

        let all: Vec<_> = mgr.resource_index().iter().collect();
        assert_eq!(all.len(), 1);
        let (hash, locations) = all[0];
        assert_eq!(
            locations,
            &[PathRef::new(fx.mods.as_str(), "pack.zip", "skins")]
        );
        assert_eq!(mgr.manifest_cache().get(hash), Some(&foo_bar()));
    }

    #[test]
    fn test_installed_hash_matches_directory_hash() {
        let fx = fixture();
        fs::write(fx.data.join("patch_0001.patch_9"), b"installed bytes").unwrap();

        let mgr = ModManager::load(&fx.config_path).unwrap();
        let entries: Vec<_> = mgr.install_index().iter().collect();
        assert_eq!(entries.len(), 1);

        let unit = fx.root.join("unit");
        write_unit(&unit, b"installed bytes", None);
        let meta = read_unit_meta(&mut DirContainer::new(unit), "").unwrap();
        assert_eq!(entries[0], (meta.hash.as_str(), "patch_0001.patch_9"));
        assert!(mgr.config().last_install_check > 0.0);
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let fx = fixture();
        write_unit(&fx.mods.join("a"), b"one", Some(FOO_BAR));
        write_unit(&fx.mods.join("b"), b"two", None);
        write_zip(&fx.mods.join("c.zip"), &[("x/modpayload", &b"three"[..])]);

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        let index = mgr.resource_index().clone();
        let manifests = mgr.manifest_cache().clone();
        assert_eq!(index.len(), 3);

        mgr.reparse_resource_folder(0).unwrap();
        assert_eq!(mgr.resource_index(), &index);
        assert_eq!(mgr.manifest_cache(), &manifests);

        mgr.reparse_resource_folder(fx.mods.clone()).unwrap();
        assert_eq!(mgr.resource_index(), &index);
    }

    #[test]
    fn test_reparse_drops_removed_units() {
        let fx = fixture();
        write_unit(&fx.mods.join("a"), b"one", None);
        write_unit(&fx.mods.join("b"), b"two", None);

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        assert_eq!(mgr.resource_index().len(), 2);

        fs::remove_dir_all(fx.mods.join("b")).unwrap();
        mgr.reparse_resource_folder(0).unwrap();
        assert_eq!(mgr.resource_index().len(), 1);
    }

    #[test]
    fn test_prune_only_touches_one_folder() {
        let fx = fixture();
        let other = fx.root.join("other");
        write_unit(&fx.mods.join("a"), b"shared", Some(FOO_BAR));
        write_unit(&other.join("a"), b"shared", Some(FOO_BAR));
        write_unit(&fx.mods.join("b"), b"only here", None);

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        mgr.add_resource_folder(&other, false).unwrap();

        assert_eq!(mgr.prune_resource_folder(&fx.mods).unwrap(), 2);
        let remaining: Vec<_> = mgr.resource_index().iter().collect();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0]
            .1
            .iter()
            .all(|l| l.resource_group == other.as_str()));

        let shared = digest_parts([&b"shared"[..]]).unwrap();
        assert_eq!(mgr.manifest_cache().get(&shared), Some(&foo_bar()));
    }

    #[test]
    fn test_add_folder_twice() {
        let fx = fixture();
        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();

        assert!(matches!(
            mgr.add_resource_folder(&fx.mods, false),
            Err(Error::FolderAlreadyRegistered(_))
        ));
        mgr.add_resource_folder(&fx.mods, true).unwrap();
        assert_eq!(mgr.resource_folders().len(), 1);
    }

    #[test]
    fn test_add_folder_rejects_missing_and_files() {
        let fx = fixture();
        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        let file = fx.root.join("file.txt");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            mgr.add_resource_folder(&fx.root.join("nope"), false),
            Err(Error::MissingPath(_))
        ));
        assert!(matches!(
            mgr.add_resource_folder(&file, false),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn test_reparse_unknown_folder() {
        let fx = fixture();
        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        assert!(matches!(
            mgr.reparse_resource_folder(3),
            Err(Error::FolderNotRegistered(_))
        ));
        assert!(matches!(
            mgr.reparse_resource_folder(fx.mods.clone()),
            Err(Error::FolderNotRegistered(_))
        ));
    }

    #[test]
    fn test_same_hash_different_manifest_conflicts() {
        let fx = fixture();
        write_unit(&fx.mods.join("a"), b"same", Some(FOO_BAR));
        write_unit(
            &fx.mods.join("b"),
            b"same",
            Some(r#"{"name":"Other","description":"Thing"}"#),
        );

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        let err = mgr.add_resource_folder(&fx.mods, false).unwrap_err();
        assert!(matches!(err, Error::HashConflict { .. }), "got {err:?}");
        assert!(mgr.resource_index().is_empty());
        assert!(mgr.resource_folders().is_empty());
    }

    #[test]
    fn test_same_hash_same_manifest_records_both() {
        let fx = fixture();
        write_unit(&fx.mods.join("a"), b"same", Some(FOO_BAR));
        write_unit(&fx.mods.join("b"), b"same", Some(FOO_BAR));

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        let hash = digest_parts([&b"same"[..]]).unwrap();
        assert_eq!(mgr.resource_index().locations(&hash).len(), 2);
    }

    #[test]
    fn test_corrupt_archive_is_skipped() {
        let fx = fixture();
        fs::write(fx.mods.join("broken.zip"), b"definitely not a zip").unwrap();
        write_unit(&fx.mods.join("good"), b"payload", None);

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        assert_eq!(mgr.resource_index().len(), 1);
    }

    #[test]
    fn test_corrupt_archive_entry_is_skipped() {
        let fx = fixture();
        let payload = b"stored payload with a flipped byte";
        let zip_path = fx.mods.join("flipped.zip");
        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("modpayload", options).unwrap();
        writer.write_all(payload).unwrap();
        writer.finish().unwrap();

        let mut bytes = fs::read(&zip_path).unwrap();
        let at = bytes
            .windows(payload.len())
            .position(|w| w == payload)
            .unwrap();
        bytes[at + 3] ^= 0x20;
        fs::write(&zip_path, bytes).unwrap();
        write_unit(&fx.mods.join("good"), b"payload", None);

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        let hash = digest_parts([&b"payload"[..]]).unwrap();
        assert_eq!(mgr.resource_index().len(), 1);
        assert_eq!(
            mgr.resource_index().locations(&hash),
            &[PathRef::new(fx.mods.as_str(), "good", "")]
        );
    }

    #[test]
    fn test_encrypted_archive_is_skipped() {
        let fx = fixture();
        let mut writer =
            zip::ZipWriter::new(File::create(fx.mods.join("locked.zip")).unwrap());
        let options =
            SimpleFileOptions::default().with_aes_encryption(zip::AesMode::Aes256, "secret");
        writer.start_file("skins/modpayload", options).unwrap();
        writer.write_all(b"hidden").unwrap();
        writer.finish().unwrap();
        write_unit(&fx.mods.join("good"), b"payload", None);

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        assert_eq!(mgr.resource_index().len(), 1);
        assert!(mgr
            .resource_index()
            .iter()
            .all(|(_, ls)| ls.iter().all(|l| l.path == "good")));
    }

    #[test]
    fn test_archive_with_backslash_names() {
        let fx = fixture();
        write_zip(
            &fx.mods.join("pack.zip"),
            &[
                ("skins\\modpayload", &b"payload"[..]),
                ("skins\\manifest.json", FOO_BAR.as_bytes()),
            ],
        );

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();

        let hash = digest_parts([&b"payload"[..]]).unwrap();
        assert_eq!(
            mgr.resource_index().locations(&hash),
            &[PathRef::new(fx.mods.as_str(), "pack.zip", "skins")]
        );
        assert_eq!(mgr.manifest_cache().get(&hash), Some(&foo_bar()));
    }

    #[test]
    fn test_trailing_separator_names_the_same_folder() {
        let fx = fixture();
        write_unit(&fx.mods.join("a"), b"one", None);

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        let with_slash = Utf8PathBuf::from(format!("{}/", fx.mods));
        mgr.add_resource_folder(&with_slash, false).unwrap();
        assert_eq!(mgr.resource_folders()[0].path, fx.mods);
        assert!(mgr
            .resource_index()
            .iter()
            .all(|(_, ls)| ls.iter().all(|l| l.resource_group == fx.mods.as_str())));

        assert_eq!(mgr.prune_resource_folder(&fx.mods).unwrap(), 1);
        assert!(mgr.resource_index().is_empty());

        fs::remove_dir_all(fx.mods.join("a")).unwrap();
        write_unit(&fx.mods.join("b"), b"two", None);
        mgr.reparse_resource_folder(with_slash).unwrap();
        let all: Vec<_> = mgr.resource_index().iter().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1, &[PathRef::new(fx.mods.as_str(), "b", "")]);
    }

    #[test]
    fn test_failed_write_leaves_state_untouched() {
        let fx = fixture();
        write_unit(&fx.mods.join("a"), b"payload", Some(FOO_BAR));

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        // A directory in place of the index file makes saving it fail.
        fs::create_dir_all(&mgr.paths.resources).unwrap();

        let err = mgr.add_resource_folder(&fx.mods, false).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got {err:?}");
        assert!(mgr.resource_index().is_empty());
        assert!(mgr.manifest_cache().is_empty());
        assert!(mgr.resource_folders().is_empty());

        fs::remove_dir(&mgr.paths.resources).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        assert_eq!(mgr.resource_index().len(), 1);
    }

    #[test]
    fn test_install_conflict_keeps_previous_index() {
        let fx = fixture();
        fs::write(fx.data.join("a.patch_0"), b"same").unwrap();

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        let before = mgr.install_index().clone();
        let checked = mgr.config().last_install_check;
        assert_eq!(before.len(), 1);

        fs::write(fx.data.join("b.patch_0"), b"same").unwrap();
        let err = mgr.reparse_installed_mods().unwrap_err();
        assert!(matches!(err, Error::InstallConflict { .. }));

        assert_eq!(mgr.install_index(), &before);
        assert_eq!(mgr.config().last_install_check, checked);
        let paths = IndexPaths::beside(&fx.config_path);
        assert_eq!(InstallIndex::load(&paths.install).unwrap(), before);
        assert_eq!(
            Config::load(&fx.config_path).unwrap().last_install_check,
            checked
        );
    }

    #[test]
    fn test_load_rescans_stale_folder() {
        let fx = fixture();
        write_unit(&fx.mods.join("a"), b"one", None);
        {
            let mut mgr = ModManager::load(&fx.config_path).unwrap();
            mgr.add_resource_folder(&fx.mods, false).unwrap();
        }

        write_unit(&fx.mods.join("b"), b"two", None);
        set_file_mtime(&fx.mods, FileTime::from_unix_time(4_000_000_000, 0)).unwrap();

        let mgr = ModManager::load(&fx.config_path).unwrap();
        assert_eq!(mgr.resource_index().len(), 2);
        assert_eq!(mgr.resource_folders()[0].last_modified, 4_000_000_000.0);
    }

    #[test]
    fn test_load_skips_fresh_folder() {
        let fx = fixture();
        write_unit(&fx.mods.join("a"), b"one", None);
        set_file_mtime(&fx.mods, FileTime::from_unix_time(1_000_000, 0)).unwrap();
        {
            let mut mgr = ModManager::load(&fx.config_path).unwrap();
            mgr.add_resource_folder(&fx.mods, false).unwrap();
        }

        // A new unit without an mtime change is not picked up on load.
        write_unit(&fx.mods.join("b"), b"two", None);
        set_file_mtime(&fx.mods, FileTime::from_unix_time(1_000_000, 0)).unwrap();

        let mgr = ModManager::load(&fx.config_path).unwrap();
        assert_eq!(mgr.resource_index().len(), 1);
    }

    #[test]
    fn test_load_missing_game_data() {
        let fx = fixture();
        fs::remove_dir_all(&fx.data).unwrap();
        assert!(matches!(
            ModManager::load(&fx.config_path),
            Err(Error::MissingPath(_))
        ));
    }

    #[test]
    fn test_register_new_mod() {
        let fx = fixture();
        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        assert!(mgr.resource_index().is_empty());

        write_unit(&fx.mods.join("nested/new"), b"new", Some(FOO_BAR));
        mgr.register_new_mod(&fx.mods.join("nested/new")).unwrap();

        let hash = digest_parts([&b"new"[..]]).unwrap();
        assert_eq!(
            mgr.resource_index().locations(&hash),
            &[PathRef::new(fx.mods.as_str(), "nested/new", "")]
        );

        let outside = fx.root.join("outside");
        write_unit(&outside, b"x", None);
        assert!(matches!(
            mgr.register_new_mod(&outside),
            Err(Error::NotInResourceFolder(_))
        ));
    }

    #[test]
    fn test_add_resource_copies_by_hash() {
        let fx = fixture();
        let archive = fx.root.join("download.zip");
        write_zip(
            &archive,
            &[
                ("skins/modpayload", &b"payload"[..]),
                ("skins/manifest.json", FOO_BAR.as_bytes()),
            ],
        );

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        assert!(matches!(
            mgr.add_resource(&archive, None),
            Err(Error::NoResourceFolders)
        ));

        mgr.add_resource_folder(&fx.mods, false).unwrap();
        let hash = mgr.add_resource(&archive, None).unwrap();

        let copied = format!("{hash}.zip");
        assert!(fx.mods.join(&copied).is_file());
        assert_eq!(
            mgr.resource_index().locations(&hash),
            &[PathRef::new(fx.mods.as_str(), copied.as_str(), "skins")]
        );
        assert_eq!(mgr.manifest_cache().get(&hash), Some(&foo_bar()));

        assert!(matches!(
            mgr.add_resource(&archive, None),
            Err(Error::DuplicateLocation { .. })
        ));
    }

    #[test]
    fn test_add_resource_rejects_plain_files() {
        let fx = fixture();
        let file = fx.root.join("payload.bin");
        fs::write(&file, b"x").unwrap();

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();
        assert!(matches!(
            mgr.add_resource(&file, None),
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_list_installed_mods() {
        let fx = fixture();
        write_unit(&fx.mods.join("named"), b"one", Some(FOO_BAR));
        write_unit(&fx.mods.join("capes"), b"two", None);
        fs::write(fx.data.join("c.patch_0"), b"one").unwrap();
        fs::write(fx.data.join("a.patch_0"), b"two").unwrap();
        fs::write(fx.data.join("b.patch_0"), b"three").unwrap();

        let mut mgr = ModManager::load(&fx.config_path).unwrap();
        mgr.add_resource_folder(&fx.mods, false).unwrap();

        let rows = mgr.list_installed_mods();
        assert_eq!(
            rows,
            vec![
                InstalledMod {
                    installed_file: "a.patch_0".into(),
                    name: "capes".into(),
                    description: None,
                    source: RowSource::Resource,
                },
                InstalledMod {
                    installed_file: "b.patch_0".into(),
                    name: "Unknown".into(),
                    description: None,
                    source: RowSource::Unknown,
                },
                InstalledMod {
                    installed_file: "c.patch_0".into(),
                    name: "Foo".into(),
                    description: Some("Bar".into()),
                    source: RowSource::Manifest,
                },
            ]
        );
    }

    #[test]
    fn test_folder_ref_from_str() {
        assert_eq!("2".parse::<FolderRef>().unwrap(), FolderRef::Index(2));
        assert_eq!(
            "/mods".parse::<FolderRef>().unwrap(),
            FolderRef::Path("/mods".into())
        );
    }
}
