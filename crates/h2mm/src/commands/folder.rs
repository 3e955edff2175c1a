use super::open_manager;
use crate::errors::CliError;
use crate::println_pad;
use camino::Utf8Path;
use colored::Colorize;
use h2mm_index::{FolderRef, ModManager};
use miette::Result;

fn print_counts(manager: &ModManager) {
    println_pad!(
        "{} {}   {} {}",
        "Indexed mods:".bright_white().bold(),
        manager.resource_index().len().to_string().bright_cyan(),
        "Manifests:".bright_white().bold(),
        manager.manifest_cache().len().to_string().bright_cyan()
    );
}

pub fn add_resource_folder(config_path: &Utf8Path, path: &Utf8Path, skip_existing: bool) -> Result<()> {
    let mut manager = open_manager(config_path)?;
    manager
        .add_resource_folder(path, skip_existing)
        .map_err(CliError::from)?;

    println!("{}", "✓ Resource folder added!".bright_green().bold());
    println_pad!("{} {}", "Path:".bright_white().bold(), path.as_str().bright_green());
    print_counts(&manager);
    Ok(())
}

pub fn reparse_resource_folder(config_path: &Utf8Path, folder: FolderRef) -> Result<()> {
    let mut manager = open_manager(config_path)?;
    manager
        .reparse_resource_folder(folder)
        .map_err(CliError::from)?;

    println!("{}", "✓ Resource folder re-scanned!".bright_green().bold());
    print_counts(&manager);
    Ok(())
}

pub fn prune_resource_folder(config_path: &Utf8Path, path: &Utf8Path) -> Result<()> {
    let mut manager = open_manager(config_path)?;
    let removed = manager
        .prune_resource_folder(path)
        .map_err(CliError::from)?;

    println!(
        "{} {}",
        "✓ Pruned locations:".bright_green().bold(),
        removed.to_string().bright_cyan()
    );
    print_counts(&manager);
    Ok(())
}

pub fn list_resource_folders(config_path: &Utf8Path) -> Result<()> {
    let manager = open_manager(config_path)?;
    let config = manager.config();

    println!();
    println!("  {} {}", "config_file:".bright_white(), manager.config_path());
    let data_status = if config.data_dir().is_dir() {
        "✓".bright_green()
    } else {
        "✗".bright_red()
    };
    println!(
        "  {} {} {}",
        "game_path:".bright_white(),
        config.game_path,
        data_status
    );
    println!();

    if manager.resource_folders().is_empty() {
        println_pad!("{}", "No resource folders configured.".bright_yellow());
        println_pad!(
            "{} Use 'h2mm folder add <dir>' to add one",
            "•".bright_cyan()
        );
        return Ok(());
    }

    println!("  {}", "Resource folders:".bright_magenta().bold());
    for (index, folder) in manager.resource_folders().iter().enumerate() {
        let status = if folder.path.is_dir() {
            "✓".bright_green()
        } else {
            "✗".bright_red()
        };
        println!(
            "   {} {} {}",
            format!("[{index}]").bright_cyan(),
            folder.path.as_str().bright_white(),
            status
        );
    }
    println!();
    print_counts(&manager);
    Ok(())
}
