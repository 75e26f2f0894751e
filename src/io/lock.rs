use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file inside `.stickies/`
pub const LOCK_FILE: &str = ".lock";

/// How long a writer waits for another process before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory lock held while a process replaces `notes.json`.
///
/// Only serializes the replace itself; it is not a read-modify-write
/// transaction, so two writers can still lose each other's notes.
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another stickies process is writing")]
    Busy { path: PathBuf },
}

impl StoreLock {
    /// Take the lock in `store_dir`, retrying until `timeout` elapses.
    pub fn acquire(store_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = store_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Create {
                path: path.clone(),
                source,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            if start.elapsed() >= timeout {
                return Err(LockError::Busy { path });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
        Ok(StoreLock { _file: file, path })
    }

    pub fn acquire_default(store_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(store_dir, DEFAULT_LOCK_TIMEOUT)
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // flock is released with the descriptor
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
