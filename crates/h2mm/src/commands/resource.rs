use super::open_manager;
use crate::errors::CliError;
use crate::println_pad;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use miette::Result;

pub struct AddResourceArgs {
    pub config_path: Utf8PathBuf,
    pub archive: Utf8PathBuf,
    pub to: Option<Utf8PathBuf>,
}

pub fn add_resource(args: AddResourceArgs) -> Result<()> {
    let mut manager = open_manager(&args.config_path)?;
    let hash = manager
        .add_resource(&args.archive, args.to.as_deref())
        .map_err(CliError::from)?;

    let name = manager
        .manifest_cache()
        .get(&hash)
        .map(|m| m.name.clone())
        .or_else(|| {
            manager
                .resource_index()
                .locations(&hash)
                .first()
                .map(|l| l.display_name())
        })
        .unwrap_or_else(|| hash.clone());

    println!("{}", "✓ Mod added!".bright_green().bold());
    println_pad!("{} {}", "Name:".bright_white().bold(), name.bright_cyan());
    println_pad!("{} {}", "Hash:".bright_white().bold(), hash.dimmed());
    Ok(())
}

pub fn register_mod(config_path: &Utf8Path, path: &Utf8Path) -> Result<()> {
    let mut manager = open_manager(config_path)?;
    manager.register_new_mod(path).map_err(CliError::from)?;

    println!("{}", "✓ Mod registered!".bright_green().bold());
    println_pad!("{} {}", "Path:".bright_white().bold(), path.as_str().bright_green());
    println_pad!(
        "{} {}",
        "Indexed mods:".bright_white().bold(),
        manager.resource_index().len().to_string().bright_cyan()
    );
    Ok(())
}
