use super::open_manager;
use crate::errors::CliError;
use crate::println_pad;
use camino::Utf8Path;
use colored::Colorize;
use h2mm_index::{InstalledMod, RowSource};
use miette::Result;
use unicode_width::UnicodeWidthStr;

pub fn list_installed_mods(config_path: &Utf8Path) -> Result<()> {
    let manager = open_manager(config_path)?;
    let rows = manager.list_installed_mods();

    if rows.is_empty() {
        println_pad!("{}", "No installed mods found.".bright_yellow());
        return Ok(());
    }

    let file_width = column_width("File", rows.iter().map(|r| r.installed_file.as_str()));
    let name_width = column_width("Name", rows.iter().map(|r| r.name.as_str()));

    println!();
    println_pad!(
        "{}  {}  {}",
        pad("File", file_width).bright_white().bold(),
        pad("Name", name_width).bright_white().bold(),
        "Description".bright_white().bold()
    );
    for row in &rows {
        print_row(row, file_width, name_width);
    }
    println!();
    println_pad!(
        "{} {}",
        rows.len().to_string().bright_cyan().bold(),
        "installed mods".bright_white()
    );

    Ok(())
}

/// Terminal columns needed for a header and its cells.
fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells.map(UnicodeWidthStr::width).fold(header.width(), usize::max)
}

/// Right-pad `text` with spaces to `width` terminal columns.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn print_row(row: &InstalledMod, file_width: usize, name_width: usize) {
    let name = pad(&row.name, name_width);
    let name = match row.source {
        RowSource::Manifest => name.bright_cyan().bold(),
        RowSource::Resource => name.bright_white(),
        RowSource::Unknown => name.dimmed(),
    };
    let description = match &row.description {
        Some(d) => d.bright_white(),
        None => "N/A".dimmed(),
    };
    println_pad!(
        "{}  {}  {}",
        pad(&row.installed_file, file_width).bright_green(),
        name,
        description
    );
}

pub fn reindex_installed_mods(config_path: &Utf8Path) -> Result<()> {
    let mut manager = open_manager(config_path)?;
    manager
        .reparse_installed_mods()
        .map_err(CliError::from)?;

    println!(
        "{}",
        "✓ Installed mods re-indexed!".bright_green().bold()
    );
    println_pad!(
        "{} {}",
        "Installed mods:".bright_white().bold(),
        manager.install_index().len().to_string().bright_cyan()
    );
    Ok(())
}
