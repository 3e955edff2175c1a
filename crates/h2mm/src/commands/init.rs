use crate::errors::CliError;
use crate::println_pad;
use camino::Utf8PathBuf;
use colored::Colorize;
use h2mm_index::{Config, ModManager};
use miette::Result;

pub struct InitConfigArgs {
    pub config_path: Utf8PathBuf,
    pub game_path: Utf8PathBuf,
    pub force: bool,
}

pub fn init_config(args: InitConfigArgs) -> Result<()> {
    let game_path = h2mm_index::utils::absolute(&args.game_path).map_err(CliError::from)?;
    if !game_path.join(h2mm_index::config::DATA_DIR).is_dir() {
        return Err(CliError::InvalidGamePath { path: game_path }.into());
    }

    let config = Config::create(&args.config_path, game_path, args.force)
        .map_err(CliError::from)?
        .ok_or_else(|| CliError::ConfigExists {
            path: args.config_path.clone(),
        })?;

    let manager = ModManager::open(config, &args.config_path).map_err(CliError::from)?;

    println!(
        "{}",
        "✓ Configuration created successfully!".bright_green().bold()
    );
    println!();
    println_pad!(
        "{} {}",
        "Config:".bright_white().bold(),
        args.config_path.as_str().bright_green()
    );
    println_pad!(
        "{} {}",
        "Game:".bright_white().bold(),
        manager.config().game_path.as_str().bright_green()
    );
    println_pad!(
        "{} {}",
        "Installed mods:".bright_white().bold(),
        manager.install_index().len().to_string().bright_cyan()
    );
    println!();
    println_pad!(
        "{} Add a resource folder with 'h2mm folder add <dir>'",
        "•".bright_cyan()
    );

    Ok(())
}
