use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Could not determine the default configuration path")]
    #[diagnostic(
        code(config::path_unknown),
        help("Pass the configuration file explicitly with --config <file>")
    )]
    ConfigPathUnknown,

    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(config::not_found),
        help("Run `h2mm init --game-path <dir>` to create one")
    )]
    ConfigNotFound { path: Utf8PathBuf },

    #[error("Configuration file already exists: {path}")]
    #[diagnostic(
        code(config::exists),
        help("Pass --force to overwrite it")
    )]
    ConfigExists { path: Utf8PathBuf },

    #[error("Invalid game path: {path}")]
    #[diagnostic(
        code(config::invalid_game_path),
        help("The game path must be the installation directory containing the `data` folder")
    )]
    InvalidGamePath { path: Utf8PathBuf },

    #[error("No resource folders configured")]
    #[diagnostic(
        code(folder::none),
        help("Add one with `h2mm folder add <dir>`")
    )]
    NoResourceFolders,

    #[error("Two mods share the same content hash")]
    #[diagnostic(
        code(index::hash_conflict),
        help("Remove or rename one of the duplicate files and run the command again")
    )]
    HashConflict {
        #[source]
        source: h2mm_index::Error,
    },

    #[error("Resource folder error")]
    #[diagnostic(
        code(folder::invalid),
        help("Check `h2mm folder list` for the configured folders")
    )]
    Folder {
        #[source]
        source: h2mm_index::Error,
    },

    #[error("Indexing failed")]
    #[diagnostic(code(index::failed))]
    Index {
        #[source]
        source: h2mm_index::Error,
    },
}

impl From<h2mm_index::Error> for CliError {
    fn from(source: h2mm_index::Error) -> Self {
        use h2mm_index::Error;

        match source {
            Error::ConfigNotFound(path) => Self::ConfigNotFound { path },
            Error::NoResourceFolders => Self::NoResourceFolders,
            Error::InstallConflict { .. } | Error::HashConflict { .. } => {
                Self::HashConflict { source }
            }
            Error::FolderNotRegistered(_)
            | Error::FolderAlreadyRegistered(_)
            | Error::NotADirectory(_)
            | Error::NotInResourceFolder(_) => Self::Folder { source },
            source => Self::Index { source },
        }
    }
}
