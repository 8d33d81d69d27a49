//! Advisory lock on a garden's shed.
//!
//! Only one `garden` process may plan and execute against a garden at a
//! time.  The lock file at `<garden>/.symlink-garden/lock` holds JSON
//! metadata about the holder so a contention error can name it.
use std::fs::{File, OpenOptions};
use std::io::{self, Seek as _, SeekFrom, Write as _};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who holds the lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockMetadata {
    /// Process id of the holder.
    pub pid: u32,
    /// Subcommand the holder is running.
    pub command: String,
    /// Seconds since the Unix epoch when the lock was taken.
    pub started_at_unix: u64,
}

/// Failures acquiring the garden lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process holds the lock.
    #[error(
        "garden is locked by another process: {command} (PID {pid}, started at Unix time {started_at_unix})\n\
         If no garden process is running, remove the lock file:\n  {lock_path}"
    )]
    Contended {
        /// Holder's subcommand.
        command: String,
        /// Holder's process id.
        pid: u32,
        /// When the holder took the lock.
        started_at_unix: u64,
        /// Lock file path.
        lock_path: PathBuf,
    },

    /// Another process holds the lock and its metadata is unreadable.
    #[error(
        "garden is locked (could not read lock metadata)\n\
         If no garden process is running, remove the lock file:\n  {0}"
    )]
    ContendedUnknown(PathBuf),

    /// The shed directory could not be created.
    #[error("failed to create {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The lock file could not be opened.
    #[error("failed to open lock file {path}: {source}")]
    Open {
        /// Lock file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The lock call itself failed for a reason other than contention.
    #[error("failed to acquire lock: {0}")]
    Lock(#[source] io::Error),

    /// The holder metadata could not be written.
    #[error("failed to write lock metadata: {0}")]
    WriteMetadata(#[source] io::Error),
}

/// An exclusive lock held until dropped.
#[derive(Debug)]
pub struct GardenLock {
    file: File,
    path: PathBuf,
}

impl GardenLock {
    /// Take the exclusive lock at `path`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Contended`] if another process holds the lock, or
    /// an I/O variant if the file cannot be created, locked, or written.
    pub fn acquire(path: &Path, command: &str) -> Result<Self, LockError> {
        if let Some(dir) = path.parent()
            && !dir.is_dir()
        {
            std::fs::create_dir_all(dir).map_err(|source| LockError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| LockError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        if let Err(err) = try_lock_exclusive(&file) {
            if err.kind() == io::ErrorKind::WouldBlock {
                return Err(contention_error(path));
            }
            return Err(LockError::Lock(err));
        }

        write_metadata(&file, command).map_err(LockError::WriteMetadata)?;
        tracing::debug!(path = %path.display(), "acquired garden lock");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back the metadata through the held handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold valid
    /// metadata.
    #[cfg(test)]
    pub fn read_metadata(&self) -> io::Result<LockMetadata> {
        use std::io::Read as _;

        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        serde_json::from_str(&contents).map_err(io::Error::other)
    }
}

fn write_metadata(file: &File, command: &str) -> io::Result<()> {
    let metadata = LockMetadata {
        pid: std::process::id(),
        command: command.to_string(),
        started_at_unix: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
    };
    file.set_len(0)?;
    let mut writer = io::BufWriter::new(file);
    writer.seek(SeekFrom::Start(0))?;
    serde_json::to_writer(&mut writer, &metadata).map_err(io::Error::other)?;
    writer.flush()
}

fn contention_error(path: &Path) -> LockError {
    if let Ok(contents) = std::fs::read_to_string(path)
        && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
    {
        return LockError::Contended {
            command: metadata.command,
            pid: metadata.pid,
            started_at_unix: metadata.started_at_unix,
            lock_path: path.to_path_buf(),
        };
    }
    LockError::ContendedUnknown(path.to_path_buf())
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
    use rustix::fs::{FlockOperation, flock};
    use std::os::unix::io::AsFd as _;

    flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
        .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(not(unix))]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
    match file.try_lock() {
        Ok(()) => Ok(()),
        Err(std::fs::TryLockError::WouldBlock) => Err(io::ErrorKind::WouldBlock.into()),
        Err(std::fs::TryLockError::Error(e)) => Err(e),
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn lock_path(dir: &Path) -> PathBuf {
        dir.join(".symlink-garden").join("lock")
    }

    #[test]
    fn acquire_creates_shed_and_lock_file() {
        let tmp = tempfile::tempdir().unwrap();
        let lock = GardenLock::acquire(&lock_path(tmp.path()), "tend").unwrap();
        assert!(lock.path().exists());
        assert!(tmp.path().join(".symlink-garden").is_dir());
    }

    #[test]
    fn metadata_names_the_holder() {
        let tmp = tempfile::tempdir().unwrap();
        let lock = GardenLock::acquire(&lock_path(tmp.path()), "plant").unwrap();
        let metadata = lock.read_metadata().unwrap();
        assert_eq!(metadata.command, "plant");
        assert_eq!(metadata.pid, std::process::id());
    }

    #[cfg(unix)]
    #[test]
    fn second_acquire_is_contended() {
        let tmp = tempfile::tempdir().unwrap();
        let path = lock_path(tmp.path());
        let _held = GardenLock::acquire(&path, "tend").unwrap();

        let err = GardenLock::acquire(&path, "prune").unwrap_err();
        let LockError::Contended { command, pid, .. } = err else {
            panic!("expected contention");
        };
        assert_eq!(command, "tend");
        assert_eq!(pid, std::process::id());
    }

    #[test]
    fn lock_released_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let path = lock_path(tmp.path());
        {
            let _lock = GardenLock::acquire(&path, "tend").unwrap();
        }
        let lock = GardenLock::acquire(&path, "tend").unwrap();
        assert_eq!(lock.read_metadata().unwrap().command, "tend");
    }
}
