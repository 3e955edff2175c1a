//! Error types for indexing operations.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. External error types (`std::io::Error`, `serde_json::Error`,
//! TOML and zip errors) are automatically converted via `From` impls. I/O errors
//! raised while decoding an archive entry convert to [`Error::BadArchive`].
//!
//! Errors fall into three groups:
//!
//! - **Skippable** archive conditions ([`Error::BadArchive`], [`Error::PasswordRequired`]).
//!   A folder re-scan logs these and moves on to the next candidate.
//! - **Integrity conflicts** ([`Error::InstallConflict`], [`Error::HashConflict`],
//!   [`Error::DuplicateLocation`]). These abort the current operation.
//! - **Usage errors** such as unregistered or missing folders.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning, hashing or maintaining the indices.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    /// Failed to parse or serialize a JSON index or manifest.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Any zip failure that is neither corruption nor encryption.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Any rar failure that is neither corruption nor encryption.
    #[error("RAR error in {path}: {source}")]
    Rar {
        path: Utf8PathBuf,
        #[source]
        source: unrar::error::UnrarError,
    },

    /// The archive is truncated, corrupt or not an archive at all.
    #[error("Bad archive {path}: {reason}")]
    BadArchive { path: Utf8PathBuf, reason: String },

    /// The archive is encrypted and no password was supplied.
    #[error("Password required for {path}")]
    PasswordRequired { path: Utf8PathBuf },

    /// A location did not contain exactly one target file.
    #[error("Expected exactly one target file in {location}, found {count}")]
    TargetCount { location: String, count: usize },

    /// A `manifest.json` exists but could not be parsed.
    #[error("Malformed manifest in {location}: {source}")]
    Manifest {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Only directories, `.zip` and `.rar` archives can be hashed.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(Utf8PathBuf),

    /// Two installed files produced the same content hash.
    #[error("Mod hash conflict: {hash}, {file} with {existing}")]
    InstallConflict {
        hash: String,
        file: String,
        existing: String,
    },

    /// Two different sources produced the same hash with different manifests.
    #[error("Mod hash conflict: {hash}, {location} with {existing}")]
    HashConflict {
        hash: String,
        location: String,
        existing: String,
    },

    /// The exact location is already recorded for this hash.
    #[error("Mod resource {location} already exists under hash {hash}")]
    DuplicateLocation { hash: String, location: String },

    /// A configured path does not exist.
    #[error("Path not found: {0}")]
    MissingPath(Utf8PathBuf),

    /// A resource folder path exists but is not a directory.
    #[error("Resource folder is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    /// The requested resource folder is not part of the configuration.
    #[error("Resource folder {0} not in config")]
    FolderNotRegistered(String),

    /// The resource folder is already part of the configuration.
    #[error("Resource folder {0} already exists")]
    FolderAlreadyRegistered(Utf8PathBuf),

    /// An operation needed a resource folder but none are configured.
    #[error("No resource folder found, use add_resource_folder to add one")]
    NoResourceFolders,

    /// A path handed to `register_new_mod` is outside every resource folder.
    #[error("Mod {0} not found in any resource folder")]
    NotInResourceFolder(Utf8PathBuf),

    /// The configuration file does not exist.
    #[error("Config file not found: {0}")]
    ConfigNotFound(Utf8PathBuf),

    /// A path could not be represented as UTF-8.
    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let corrupt = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<CorruptEntry>())
            .map(|c| (c.path.clone(), c.reason.clone()));
        match corrupt {
            Some((path, reason)) => Error::BadArchive { path, reason },
            None => Error::Io(err),
        }
    }
}

/// Payload of an I/O error raised while decoding an archive entry.
///
/// Archive entry readers wrap their read failures in this so that a corrupt entry
/// surfaces as [`Error::BadArchive`] once it crosses a `?`.
#[derive(Error, Debug)]
#[error("corrupt entry in {path}: {reason}")]
pub(crate) struct CorruptEntry {
    pub path: Utf8PathBuf,
    pub reason: String,
}

impl Error {
    /// Whether a folder re-scan may log this error and continue with the next candidate.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Error::BadArchive { .. } | Error::PasswordRequired { .. }
        )
    }
}
