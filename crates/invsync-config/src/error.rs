use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration directory not found")]
    ConfigDirNotFound,

    #[error(
        "run file not found. Looked in:\n\
        - current directory: run.local.kdl, .run.local.kdl, run.kdl, .run.kdl\n\
        - ./.invsync/ directory\n\
        - ~/.config/invsync/run.kdl\n\
        Set INVSYNC_RUN_PATH or pass the file explicitly"
    )]
    RunFileNotFound,

    #[error("AWX URL is not configured (set AWX_URL or `url` in config.yaml)")]
    MissingUrl,

    #[error(
        "AWX credentials are not configured (set AWX_TOKEN, or AWX_USERNAME and AWX_PASSWORD)"
    )]
    MissingCredentials,

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
