//! Uniform read-only access to directories, zip archives and rar archives.
//!
//! The scanner and the hash computer never touch `std::fs`, `zip` or `unrar`
//! directly. They work against the [`Container`] trait:
//!
//! - [`list_entries`](Container::list_entries) returns every entry name with
//!   forward-slash separators, flagged as file or directory.
//! - [`open_entry`](Container::open_entry) opens one entry for streaming reads.
//!
//! The concrete variant is picked once from the path by [`ContainerKind::detect`]
//! and opened with [`open_container`].
//!
//! A [`DirContainer`] lists only its immediate children. Archive containers list
//! every entry of the archive, nested folders included.

use crate::error::{CorruptEntry, Error, Result};
use crate::utils::{extension_lower, normalize_separators, to_utf8};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use unrar::error::{Code, UnrarError};
use zip::result::ZipError;
use zip::ZipArchive;

/// One entry reported by a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    /// Name relative to the container root, `/` separated, no trailing separator.
    pub name: String,
    pub is_dir: bool,
}

impl ContainerEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Read-only view over something that holds mod files.
pub trait Container {
    /// Path of the directory or archive on disk.
    fn path(&self) -> &Utf8Path;

    /// List the entries of the container.
    fn list_entries(&mut self) -> Result<Vec<ContainerEntry>>;

    /// Open an entry by the name returned from [`list_entries`](Self::list_entries).
    fn open_entry(&mut self, name: &str) -> Result<Box<dyn Read + '_>>;
}

/// The closed set of container variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Directory,
    Zip,
    Rar,
}

impl ContainerKind {
    /// Classify an existing path.
    ///
    /// Directories win over extensions; files must end in `.zip` or `.rar`
    /// (case-insensitive).
    pub fn detect(path: &Utf8Path) -> Result<Self> {
        if path.as_std_path().is_dir() {
            return Ok(ContainerKind::Directory);
        }
        Self::from_file_name(path.as_str())
            .ok_or_else(|| Error::UnsupportedFileType(path.to_path_buf()))
    }

    /// Archive kind implied by a file name, if any.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match extension_lower(name).as_deref() {
            Some("zip") => Some(ContainerKind::Zip),
            Some("rar") => Some(ContainerKind::Rar),
            _ => None,
        }
    }

    pub fn is_archive(self) -> bool {
        !matches!(self, ContainerKind::Directory)
    }
}

/// Open `path` as the given kind of container.
pub fn open_container(path: &Utf8Path, kind: ContainerKind) -> Result<Box<dyn Container>> {
    Ok(match kind {
        ContainerKind::Directory => Box::new(DirContainer::new(path.to_path_buf())),
        ContainerKind::Zip => Box::new(ZipContainer::open(path.to_path_buf())?),
        ContainerKind::Rar => Box::new(RarContainer::open(path.to_path_buf())),
    })
}

/// Filesystem directory.
pub struct DirContainer {
    dir: Utf8PathBuf,
}

impl DirContainer {
    pub fn new(dir: Utf8PathBuf) -> Self {
        Self { dir }
    }
}

impl Container for DirContainer {
    fn path(&self) -> &Utf8Path {
        &self.dir
    }

    fn list_entries(&mut self) -> Result<Vec<ContainerEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(self.dir.as_std_path())? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(
                        "Skipping non-UTF-8 entry in {}: {}",
                        self.dir,
                        raw.to_string_lossy()
                    );
                    continue;
                }
            };
            // Follows symlinks, unlike DirEntry::file_type.
            let is_dir = entry.path().is_dir();
            entries.push(ContainerEntry { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open_entry(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let file = File::open(self.dir.join(name).as_std_path())?;
        Ok(Box::new(file))
    }
}

/// Zip archive opened once and read entry by entry.
///
/// Entries are addressed by their `/` separated name, whatever separator the
/// archive stored them with.
pub struct ZipContainer {
    path: Utf8PathBuf,
    archive: ZipArchive<File>,
    /// Normalized entry name → index in the archive.
    names: BTreeMap<String, usize>,
}

impl ZipContainer {
    pub fn open(path: Utf8PathBuf) -> Result<Self> {
        let file = File::open(path.as_std_path())?;
        let archive = ZipArchive::new(file).map_err(|e| classify_zip_error(&path, e))?;
        let names = (0..archive.len())
            .filter_map(|i| {
                archive
                    .name_for_index(i)
                    .map(|raw| (normalize_separators(raw), i))
            })
            .collect();
        Ok(Self {
            path,
            archive,
            names,
        })
    }
}

impl Container for ZipContainer {
    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn list_entries(&mut self) -> Result<Vec<ContainerEntry>> {
        Ok(self
            .names
            .keys()
            .map(|name| match name.strip_suffix('/') {
                Some(dir) => ContainerEntry::dir(dir),
                None => ContainerEntry::file(name.as_str()),
            })
            .collect())
    }

    fn open_entry(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let index = *self
            .names
            .get(name)
            .ok_or(Error::Zip(ZipError::FileNotFound))?;
        let path = self.path.clone();
        let entry = self
            .archive
            .by_index(index)
            .map_err(|e| classify_zip_error(&path, e))?;
        Ok(Box::new(EntryReader { path, inner: entry }))
    }
}

/// Tags read failures of an archive entry as [`CorruptEntry`].
///
/// Decompression and checksum errors only show up while reading, after the
/// archive itself opened fine.
struct EntryReader<R> {
    path: Utf8PathBuf,
    inner: R,
}

impl<R: Read> Read for EntryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::Interrupted {
                return e;
            }
            io::Error::new(
                e.kind(),
                CorruptEntry {
                    path: self.path.clone(),
                    reason: e.to_string(),
                },
            )
        })
    }
}

fn classify_zip_error(path: &Utf8Path, err: ZipError) -> Error {
    match err {
        ZipError::UnsupportedArchive(msg) if msg == ZipError::PASSWORD_REQUIRED => {
            Error::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
        ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => Error::BadArchive {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        ZipError::Io(io) => Error::Io(io),
        other => Error::Zip(other),
    }
}

/// Rar archive.
///
/// `unrar` only walks an archive front to back, so every call reopens the
/// archive. Opened entries are decompressed into memory before being handed out.
pub struct RarContainer {
    path: Utf8PathBuf,
}

impl RarContainer {
    pub fn open(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl Container for RarContainer {
    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn list_entries(&mut self) -> Result<Vec<ContainerEntry>> {
        let listing = unrar::Archive::new(self.path.as_std_path())
            .open_for_listing()
            .map_err(|e| classify_rar_error(&self.path, e))?;

        let mut entries = Vec::new();
        for header in listing {
            let header = header.map_err(|e| classify_rar_error(&self.path, e))?;
            let name = normalize_separators(to_utf8(header.filename.clone())?.as_str());
            let name = name.trim_end_matches('/').to_string();
            entries.push(ContainerEntry {
                name,
                is_dir: header.is_directory(),
            });
        }
        Ok(entries)
    }

    fn open_entry(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let mut archive = unrar::Archive::new(self.path.as_std_path())
            .open_for_processing()
            .map_err(|e| classify_rar_error(&self.path, e))?;

        while let Some(header) = archive
            .read_header()
            .map_err(|e| classify_rar_error(&self.path, e))?
        {
            let entry_name = normalize_separators(&header.entry().filename.to_string_lossy());
            if entry_name != name {
                archive = header
                    .skip()
                    .map_err(|e| classify_rar_error(&self.path, e))?;
                continue;
            }
            if header.entry().is_encrypted() {
                return Err(Error::PasswordRequired {
                    path: self.path.clone(),
                });
            }
            let (data, _rest) = header
                .read()
                .map_err(|e| classify_rar_error(&self.path, e))?;
            return Ok(Box::new(Cursor::new(data)));
        }

        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found in {}", name, self.path),
        )))
    }
}

fn classify_rar_error(path: &Utf8Path, err: UnrarError) -> Error {
    match err.code {
        Code::MissingPassword | Code::BadPassword => Error::PasswordRequired {
            path: path.to_path_buf(),
        },
        Code::BadArchive | Code::BadData | Code::UnknownFormat => Error::BadArchive {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        _ => Error::Rar {
            path: path.to_path_buf(),
            source: err,
        },
    }
}
