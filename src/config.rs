//! Settings for port-for
//!
//! Settings come from an optional JSON file. Every field has a default, and
//! command line flags override whatever the file says.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::networking::port::DEFAULT_CONNECT_TIMEOUT;
use crate::networking::{Blacklist, PoolOptions};
use crate::selection::{SelectorOptions, DEFAULT_MAX_ATTEMPTS};
use crate::store::file::DEFAULT_STORE_PATH;
use crate::store::lock::DEFAULT_LOCK_TIMEOUT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Store file holding name to port associations
    pub store: PathBuf,

    /// Alternative assignment table data file
    pub assignments: Option<PathBuf>,

    /// Ports and ranges never handed out (`8080`, `9000-9010`)
    pub exclude: Vec<String>,

    /// Ranges shorter than this are not used for random picks
    pub min_range_len: u32,

    /// Ports trimmed from each end of a candidate range
    pub border: u16,

    /// Candidates verified before giving up
    pub max_attempts: u32,

    /// Timeout for the connect probe, in milliseconds
    pub connect_timeout_ms: u64,

    /// How long to wait for the store lock, in milliseconds
    pub lock_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE_PATH),
            assignments: None,
            exclude: Vec::new(),
            min_range_len: PoolOptions::default().min_range_len,
            border: PoolOptions::default().border,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read settings from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let settings: Self = serde_json::from_str(&content).map_err(|e| {
            Error::Configuration(format!(
                "Invalid settings in {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Settings from `path`, or the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Configuration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(Error::Configuration(
                "connect_timeout_ms must be positive".to_string(),
            ));
        }
        self.blacklist()?;
        Ok(())
    }

    pub fn blacklist(&self) -> Result<Blacklist> {
        Blacklist::parse(&self.exclude)
            .map_err(|e| Error::Configuration(format!("Invalid exclude entry: {}", e)))
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            min_range_len: self.min_range_len,
            border: self.border,
        }
    }

    pub fn selector_options(&self) -> SelectorOptions {
        SelectorOptions {
            max_attempts: self.max_attempts,
            pool: self.pool_options(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
