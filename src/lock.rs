use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::{Error, Result};

pub const DEFAULT_LOCK_PATH: &str = "/run/lock/i2c.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Named mutex serializing bus transactions between processes.
///
/// Implemented as an advisory lock on a lock file. Every process (or thread) that opens the
/// same path gets its own open file description, so they exclude each other, and the kernel
/// drops the lock if the holder dies.
#[derive(Debug)]
pub struct BusLock {
    path: PathBuf,
    file: File,
    timeout: Option<Duration>,
}

/// Holds the bus until dropped.
#[must_use = "the bus is unlocked as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BusLockGuard<'a> {
    lock: &'a BusLock,
}

impl BusLock {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| Error::Lock {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file,
            timeout: None,
        })
    }

    /// Bounds how long [`BusLock::lock`] waits. Without a timeout it blocks until the lock is
    /// free.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock(&self) -> Result<BusLockGuard<'_>> {
        match self.timeout {
            None => self.file.lock().map_err(|source| self.error(source))?,
            Some(timeout) => self.lock_until(Instant::now() + timeout)?,
        }
        Ok(BusLockGuard { lock: self })
    }

    fn lock_until(&self, deadline: Instant) -> Result<()> {
        loop {
            match self.file.try_lock() {
                Ok(()) => return Ok(()),
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockTimeout {
                            path: self.path.clone(),
                        });
                    }
                    sleep(POLL_INTERVAL);
                }
                Err(TryLockError::Error(source)) => return Err(self.error(source)),
            }
        }
    }

    fn error(&self, source: std::io::Error) -> Error {
        Error::Lock {
            path: self.path.clone(),
            source,
        }
    }
}

impl Drop for BusLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.file.unlock() {
            log::warn!("can't release bus lock {}: {}", self.lock.path.display(), e);
        }
    }
}
