use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No free port found: {0}")]
    Exhausted(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store {} is locked by another process (gave up after {:?})", path.display(), waited)]
    StoreContention { path: PathBuf, waited: Duration },

    #[error("Store {} is corrupt at line {line}: {reason}", path.display())]
    StoreCorruption {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Port {port} is already bound to {owner}")]
    PortTaken { port: u16, owner: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Capacity exhaustion and store problems get distinct codes so scripts
    /// can tell them apart. Code 2 is left to clap for usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Exhausted(_) => 3,
            Error::StoreContention { .. } => 4,
            Error::StoreCorruption { .. } => 5,
            Error::Configuration(_) => 6,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
