//! Resource indexing and content hashing for Helldivers 2 mods.
//!
//! Mods are found in configured *resource folders*, either as plain directories or
//! inside `.zip` / `.rar` archives. Every mod unit is identified by a SHA-256 hash
//! of its payload, so the same mod is recognized no matter where or how it is
//! stored. The crate maintains three persisted indices keyed by that hash:
//!
//! - **Resource index**: where each unit can be found.
//! - **Install index**: which file in the game data directory it is installed as.
//! - **Manifest cache**: the unit's display name and description.
//!
//! Re-scans are gated by modification times at two levels: a whole resource folder
//! is only re-scanned when its mtime advanced, and each directory unit is only
//! re-hashed when its own mtime changed.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use h2mm_index::ModManager;
//!
//! # fn main() -> h2mm_index::Result<()> {
//! let mut manager = ModManager::load(Utf8Path::new("config.toml"))?;
//! manager.add_resource_folder(Utf8Path::new("/home/me/hd2-mods"), true)?;
//!
//! for row in manager.list_installed_mods() {
//!     println!("{}: {}", row.installed_file, row.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod container;
pub mod error;
pub mod hashing;
pub mod index;
pub mod install;
pub mod manager;
pub mod model;
pub mod resolver;
pub mod scanner;
pub mod utils;

pub use config::{Config, ResourceFolder};
pub use container::{Container, ContainerKind};
pub use error::{Error, Result};
pub use index::{InstallIndex, ManifestCache, ResourceIndex};
pub use manager::{FolderRef, InstalledMod, ModManager, RowSource};
pub use model::{Manifest, PathRef};
pub use scanner::Candidate;
