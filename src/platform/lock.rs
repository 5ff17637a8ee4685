// nextboot - platform/lock.rs
//
// Exclusive advisory lock on the EFI volume root, held while the config is
// located, backed up, and rewritten. Two overlapping invocations would
// otherwise race on the backup-exists check.
//
// Unix: non-blocking `flock` on the directory itself, so no lock file is
// left on the volume. The lock is released when `VolumeLock` drops, on every
// exit path. Other platforms: no-op.

use crate::util::error::LockError;
use std::path::{Path, PathBuf};

/// Held exclusive lock; released on drop.
pub struct VolumeLock {
    path: PathBuf,
    #[cfg(unix)]
    _guard: nix::fcntl::Flock<std::fs::File>,
}

impl VolumeLock {
    /// Lock `dir` or fail immediately with `LockError::Busy` if another
    /// process holds it.
    #[cfg(unix)]
    pub fn acquire(dir: &Path) -> Result<Self, LockError> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        let file = std::fs::File::open(dir).map_err(|source| LockError::Open {
            path: dir.to_path_buf(),
            source,
        })?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(guard) => {
                tracing::debug!(path = %dir.display(), "Volume lock acquired");
                Ok(Self {
                    path: dir.to_path_buf(),
                    _guard: guard,
                })
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Err(LockError::Busy {
                path: dir.to_path_buf(),
            }),
            Err((_, errno)) => Err(LockError::Lock {
                path: dir.to_path_buf(),
                source: std::io::Error::from(errno),
            }),
        }
    }

    #[cfg(not(unix))]
    pub fn acquire(dir: &Path) -> Result<Self, LockError> {
        tracing::debug!(path = %dir.display(), "Volume locking not supported here; continuing");
        Ok(Self {
            path: dir.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for VolumeLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeLock").field("path", &self.path).finish()
    }
}

impl Drop for VolumeLock {
    fn drop(&mut self) {
        tracing::debug!(path = %self.path.display(), "Volume lock released");
    }
}
