//! Scoped advisory locking for store files
//!
//! Locks live on a sidecar file next to the store so the store itself can be
//! replaced by an atomic rename while the lock is held. A `LockGuard`
//! releases the lock when dropped, on every exit path.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use nix::errno::Errno;
use nix::fcntl::{flock, FlockArg};

use crate::error::{Error, Result};

/// How long a lock wait may take by default
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Shared for readers, exclusive for read-modify-write cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl LockMode {
    fn nonblocking_arg(self) -> FlockArg {
        match self {
            LockMode::Shared => FlockArg::LockSharedNonblock,
            LockMode::Exclusive => FlockArg::LockExclusiveNonblock,
        }
    }
}

/// Lock file guarding one store
#[derive(Debug, Clone)]
pub struct LockFile {
    path: PathBuf,
    timeout: Duration,
}

impl LockFile {
    /// Lock file for the store at `store_path`
    pub fn for_store(store_path: &Path, timeout: Duration) -> Self {
        let mut name = store_path.as_os_str().to_os_string();
        name.push(".lock");
        Self {
            path: PathBuf::from(name),
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the lock, polling until the timeout expires
    pub fn acquire(&self, mode: LockMode) -> Result<LockGuard> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)?;

        let started = Instant::now();
        loop {
            match flock(file.as_raw_fd(), mode.nonblocking_arg()) {
                Ok(()) => {
                    debug!("Acquired {:?} lock on {}", mode, self.path.display());
                    return Ok(LockGuard { file, mode });
                }
                Err(Errno::EINTR) => continue,
                Err(e) if e == Errno::EWOULDBLOCK => {
                    let waited = started.elapsed();
                    if waited >= self.timeout {
                        warn!(
                            "Gave up waiting for {:?} lock on {} after {:?}",
                            mode,
                            self.path.display(),
                            waited
                        );
                        return Err(Error::StoreContention {
                            path: self.path.clone(),
                            waited,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(Error::Io(e.into())),
            }
        }
    }
}

/// Held lock, released on drop
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    mode: LockMode,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Closing the descriptor would release it too
        if let Err(e) = flock(self.file.as_raw_fd(), FlockArg::Unlock) {
            debug!("Failed to release {:?} lock: {}", self.mode, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lock_in(dir: &TempDir, timeout: Duration) -> LockFile {
        LockFile::for_store(&dir.path().join("ports.conf"), timeout)
    }

    #[test]
    fn test_lock_path_is_sidecar() {
        let lock = LockFile::for_store(Path::new("/etc/port-for.conf"), DEFAULT_LOCK_TIMEOUT);
        assert_eq!(lock.path(), Path::new("/etc/port-for.conf.lock"));
    }

    #[test]
    fn test_exclusive_lock_times_out_while_held() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, Duration::from_millis(100));

        let _held = lock.acquire(LockMode::Exclusive).unwrap();
        let err = lock.acquire(LockMode::Exclusive).unwrap_err();

        assert!(matches!(err, Error::StoreContention { .. }));
    }

    #[test]
    fn test_shared_locks_coexist() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, Duration::from_millis(100));

        let _first = lock.acquire(LockMode::Shared).unwrap();
        let _second = lock.acquire(LockMode::Shared).unwrap();

        assert!(matches!(
            lock.acquire(LockMode::Exclusive),
            Err(Error::StoreContention { .. })
        ));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, Duration::from_millis(100));

        drop(lock.acquire(LockMode::Exclusive).unwrap());
        assert!(lock.acquire(LockMode::Exclusive).is_ok());
    }
}
