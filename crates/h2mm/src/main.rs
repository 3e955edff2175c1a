use camino::Utf8PathBuf;
use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    add_resource, add_resource_folder, init_config, list_installed_mods, list_resource_folders,
    prune_resource_folder, register_mod, reindex_installed_mods, reparse_resource_folder,
    AddResourceArgs, InitConfigArgs,
};
use errors::CliError;
use h2mm_index::FolderRef;
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (defaults to config.toml next to the executable)
    #[arg(short, long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Print debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new configuration for a game installation
    Init {
        /// The game installation directory (the one containing `data`)
        #[arg(short, long)]
        game_path: Utf8PathBuf,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
    /// List mods installed in the game data directory
    List,
    /// Manage resource folders
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Copy a mod archive into a resource folder and index it
    Add {
        /// The zip or rar archive holding the mod
        archive: Utf8PathBuf,

        /// The resource folder to copy into (defaults to the first one)
        #[arg(long)]
        to: Option<Utf8PathBuf>,
    },
    /// Index a mod that already lives inside a resource folder
    Register {
        /// Directory or archive inside a resource folder
        path: Utf8PathBuf,
    },
    /// Rebuild the installed mods index
    Reindex,
}

#[derive(Subcommand, Debug)]
pub enum FolderCommands {
    /// Register and scan a resource folder
    Add {
        path: Utf8PathBuf,

        /// Do nothing if the folder is already registered
        #[arg(long)]
        skip_existing: bool,
    },
    /// Re-scan a resource folder, given by path or by its position in `folder list`
    Reparse { folder: FolderRef },
    /// Forget every mod indexed under a resource folder
    Prune { path: Utf8PathBuf },
    /// Show the configured resource folders
    List,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_tracing(args.verbose);

    let config_path = args
        .config
        .or_else(utils::config::default_config_path)
        .ok_or(CliError::ConfigPathUnknown)?;
    tracing::debug!("Using config {}", config_path);

    match args.command {
        Commands::Init { game_path, force } => init_config(InitConfigArgs {
            config_path,
            game_path,
            force,
        }),
        Commands::List => list_installed_mods(&config_path),
        Commands::Folder { command } => match command {
            FolderCommands::Add {
                path,
                skip_existing,
            } => add_resource_folder(&config_path, &path, skip_existing),
            FolderCommands::Reparse { folder } => reparse_resource_folder(&config_path, folder),
            FolderCommands::Prune { path } => prune_resource_folder(&config_path, &path),
            FolderCommands::List => list_resource_folders(&config_path),
        },
        Commands::Add { archive, to } => add_resource(AddResourceArgs {
            config_path,
            archive,
            to,
        }),
        Commands::Register { path } => register_mod(&config_path, &path),
        Commands::Reindex => reindex_installed_mods(&config_path),
    }
}
