use crate::symbol::SymbolError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoaderError>;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Root path is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(#[from] SymbolError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Host loader failed for {symbol}: {source}")]
    HostLoader {
        symbol: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Resolver lock poisoned")]
    LockPoisoned,
}
