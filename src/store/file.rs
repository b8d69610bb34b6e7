use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use tempfile::NamedTempFile;

use super::codec;
use super::lock::{LockFile, LockMode, DEFAULT_LOCK_TIMEOUT};
use super::{validate_name, Association, AssociationStore, Associations, Claim};
use crate::error::{Error, Result};

/// Default location of the store file
pub const DEFAULT_STORE_PATH: &str = "/etc/port-for.conf";

/// Mode of a store file created from scratch. Every user may read it
pub const NEW_STORE_MODE: u32 = 0o644;

/// Store backed by a text file shared between processes.
///
/// The file is re-read on every call. Mutations hold an exclusive lock for
/// the whole read-modify-write cycle and replace the file atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock: LockFile,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_lock_timeout(path, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout<P: AsRef<Path>>(path: P, lock_timeout: Duration) -> Self {
        let path = path.as_ref().to_path_buf();
        let lock = LockFile::for_store(&path, lock_timeout);
        Self { path, lock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current table. Missing file means empty store
    fn load(&self) -> Result<Associations> {
        match fs::read_to_string(&self.path) {
            Ok(content) => codec::parse(&content, &self.path),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Associations::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the table next to the store and rename it into place. The
    /// replacement keeps the mode of the file it replaces
    fn save(&self, table: &Associations) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let permissions = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.permissions(),
            Err(e) if e.kind() == ErrorKind::NotFound => fs::Permissions::from_mode(NEW_STORE_MODE),
            Err(e) => return Err(e.into()),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        // Set after creation so the umask does not apply
        tmp.as_file().set_permissions(permissions)?;
        tmp.write_all(codec::render(table).as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("Saved {} associations to {}", table.len(), self.path.display());
        Ok(())
    }

    /// Read under a shared lock. Writers replace the file atomically, so a
    /// reader that may not create the lock file still sees whole states
    fn read<T>(&self, f: impl FnOnce(&Associations) -> T) -> Result<T> {
        if !self.path.exists() {
            return Ok(f(&Associations::new()));
        }
        let _guard = match self.lock.acquire(LockMode::Shared) {
            Ok(guard) => Some(guard),
            Err(Error::Io(e)) if e.kind() == ErrorKind::PermissionDenied => {
                debug!(
                    "Reading {} without {}: {}",
                    self.path.display(),
                    self.lock.path().display(),
                    e
                );
                None
            }
            Err(e) => return Err(e),
        };
        let table = self.load()?;
        Ok(f(&table))
    }

    /// Run one locked read-modify-write cycle. `f` returns the result and
    /// whether the table changed
    fn update<T>(&self, f: impl FnOnce(&mut Associations) -> Result<(T, bool)>) -> Result<T> {
        let _guard = self.lock.acquire(LockMode::Exclusive)?;
        let mut table = self.load()?;
        let (result, changed) = f(&mut table)?;
        if changed {
            self.save(&table)?;
        }
        Ok(result)
    }
}

impl AssociationStore for FileStore {
    fn lookup(&self, name: &str) -> Result<Option<u16>> {
        self.read(|table| table.get(name))
    }

    fn bind(&self, name: &str, port: u16) -> Result<()> {
        validate_name(name)?;
        self.update(|table| {
            let changed = table.get(name) != Some(port);
            table.bind(name, port)?;
            Ok(((), changed))
        })?;
        info!("Bound {} to port {}", name, port);
        Ok(())
    }

    fn claim(&self, name: &str, port: u16) -> Result<Claim> {
        validate_name(name)?;
        self.update(|table| {
            let claim = table.claim(name, port)?;
            Ok((claim, matches!(claim, Claim::Committed(_))))
        })
    }

    fn unbind(&self, name: &str) -> Result<bool> {
        let removed = self.update(|table| {
            let removed = table.remove(name);
            Ok((removed, removed))
        })?;
        if removed {
            info!("Unbound {}", name);
        }
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<Association>> {
        self.read(|table| table.clone().into_vec())
    }
}
