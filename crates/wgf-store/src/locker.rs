//! Advisory locking of configuration files.
//!
//! Locks are `flock(2)` locks taken on a sidecar `<file>.lock` next to the
//! configuration file. Using a sidecar keeps the lock valid while the file
//! itself is replaced by an atomic rename, and the kernel drops the lock if
//! the holding process dies.

use std::fs::{self, File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{FlockArg, flock};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Delay between two non-blocking attempts when a timeout is configured.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Kind of lock held on a configuration path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many readers may hold the lock at once.
    Shared,
    /// Only one holder, excluding readers too.
    Exclusive,
}

impl LockMode {
    const fn blocking(self) -> FlockArg {
        match self {
            Self::Shared => FlockArg::LockShared,
            Self::Exclusive => FlockArg::LockExclusive,
        }
    }

    const fn non_blocking(self) -> FlockArg {
        match self {
            Self::Shared => FlockArg::LockSharedNonblock,
            Self::Exclusive => FlockArg::LockExclusiveNonblock,
        }
    }
}

/// A held lock. Released when dropped.
#[derive(Debug)]
pub struct ConfigurationLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl ConfigurationLock {
    /// The configuration path this lock guards.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The kind of lock held.
    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for ConfigurationLock {
    fn drop(&mut self) {
        if let Err(e) = flock(self.file.as_raw_fd(), FlockArg::Unlock) {
            // Closing the descriptor right after releases the lock anyway.
            warn!(path = %self.path.display(), error = %e, "failed to unlock configuration");
        } else {
            debug!(path = %self.path.display(), mode = ?self.mode, "released configuration lock");
        }
    }
}

/// Hands out scoped locks on configuration paths.
///
/// With no timeout, acquisition blocks until the lock is free. With a
/// timeout, acquisition polls and fails with [`Error::LockTimeout`] once it
/// has waited that long.
#[derive(Debug, Clone)]
pub struct ConfigurationLocker {
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl ConfigurationLocker {
    /// Creates a locker with the given acquisition timeout.
    #[must_use]
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the delay between non-blocking attempts.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The configured acquisition timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Locks `path` for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened, the OS refuses the
    /// lock, or the timeout elapses.
    pub fn lock_exclusively(&self, path: &Path) -> Result<ConfigurationLock> {
        self.acquire(path, LockMode::Exclusive)
    }

    /// Locks `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened, the OS refuses the
    /// lock, or the timeout elapses.
    pub fn lock_shared(&self, path: &Path) -> Result<ConfigurationLock> {
        self.acquire(path, LockMode::Shared)
    }

    fn acquire(&self, path: &Path, mode: LockMode) -> Result<ConfigurationLock> {
        let lock_path = lock_file_path(path);
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::io(&lock_path, e))?;

        match self.timeout {
            None => flock(file.as_raw_fd(), mode.blocking()).map_err(|e| lock_error(path, e))?,
            Some(timeout) => self.poll(&file, path, mode, timeout)?,
        }

        debug!(path = %path.display(), mode = ?mode, "acquired configuration lock");
        Ok(ConfigurationLock {
            file,
            path: path.to_path_buf(),
            mode,
        })
    }

    fn poll(&self, file: &File, path: &Path, mode: LockMode, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            match flock(file.as_raw_fd(), mode.non_blocking()) {
                Ok(()) => return Ok(()),
                Err(errno) if errno == Errno::EWOULDBLOCK || errno == Errno::EINTR => {
                    if started.elapsed() >= timeout {
                        return Err(Error::LockTimeout {
                            path: path.to_path_buf(),
                            timeout,
                        });
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(errno) => return Err(lock_error(path, errno)),
            }
        }
    }
}

impl Default for ConfigurationLocker {
    fn default() -> Self {
        Self::new(None)
    }
}

fn lock_error(path: &Path, errno: Errno) -> Error {
    Error::Lock {
        path: path.to_path_buf(),
        reason: errno.to_string(),
    }
}

/// The sidecar file locked on behalf of `path`.
#[must_use]
pub fn lock_file_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}
