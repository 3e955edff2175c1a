use crate::errors::CliError;
use camino::Utf8Path;
use h2mm_index::ModManager;

mod folder;
mod init;
mod list;
mod resource;

pub use folder::{
    add_resource_folder, list_resource_folders, prune_resource_folder, reparse_resource_folder,
};
pub use init::{init_config, InitConfigArgs};
pub use list::{list_installed_mods, reindex_installed_mods};
pub use resource::{add_resource, register_mod, AddResourceArgs};

/// Load the manager, bringing stale indices up to date.
fn open_manager(config_path: &Utf8Path) -> Result<ModManager, CliError> {
    Ok(ModManager::load(config_path)?)
}
