//! Pid file handling.
//!
//! [`PidFile`] is an owned handle: the file holds the recording process id,
//! stays exclusively `flock`ed while the handle lives, and is unlinked by
//! [`PidFile::remove`] only in the process that wrote it.
//!
//! [`write_pid_file`] keeps one such handle in a process-wide slot and
//! registers an exit hook (once) that removes it at normal termination. The
//! slot exists only because `atexit` handlers cannot receive arguments.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::PidFileError;

#[cfg(unix)]
type LockedFile = nix::fcntl::Flock<File>;
#[cfg(not(unix))]
type LockedFile = File;

/// The pid file owned by this process, if any.
static OWNED: Mutex<Option<PidFile>> = parking_lot::const_mutex(None);

static EXIT_HOOK_REGISTERED: AtomicBool = AtomicBool::new(false);

/// A locked file containing the id of the process that wrote it.
pub struct PidFile {
    path: PathBuf,
    file: LockedFile,
    pid: u32,
}

impl std::fmt::Debug for PidFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidFile")
            .field("path", &self.path)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl PidFile {
    /// Create (or truncate) `path`, write the current process id followed by
    /// a newline and take an exclusive advisory lock.
    ///
    /// On failure the partially written file is removed and the error of the
    /// failing step is returned.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, PidFileError> {
        let path = path.as_ref();
        let pid = std::process::id();

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| PidFileError::new(path, "open", e))?;

        let written = writeln!(file, "{pid}")
            .map_err(|e| ("write", e))
            .and_then(|()| file.flush().map_err(|e| ("flush", e)));
        if let Err((stage, e)) = written {
            return Err(rollback(path, file, stage, e));
        }

        let file = lock(file).map_err(|(file, e)| rollback(path, file, "lock", e))?;

        tracing::debug!("Wrote pid file {} (pid {})", path.display(), pid);
        Ok(Self {
            path: path.to_path_buf(),
            file,
            pid,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Process id recorded in the file.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Unlink the file and release the lock.
    ///
    /// Does nothing and returns `false` when called from a process other
    /// than the one that wrote the file, such as a forked child.
    pub fn remove(self) -> bool {
        self.remove_as(std::process::id())
    }

    fn remove_as(self, pid: u32) -> bool {
        if pid != self.pid {
            tracing::trace!(
                "Not removing pid file {} owned by pid {}",
                self.path.display(),
                self.pid
            );
            // Dropping would unlock the descriptor shared with the owner.
            std::mem::forget(self);
            return false;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove pid file {}: {}", self.path.display(), e);
        }
        drop(self.file);
        true
    }
}

#[cfg(unix)]
fn lock(file: File) -> Result<LockedFile, (File, io::Error)> {
    use nix::fcntl::{Flock, FlockArg};

    Flock::lock(file, FlockArg::LockExclusive).map_err(|(file, errno)| (file, io::Error::from(errno)))
}

#[cfg(not(unix))]
fn lock(file: File) -> Result<LockedFile, (File, io::Error)> {
    Ok(file)
}

fn rollback(path: &Path, file: File, stage: &'static str, source: io::Error) -> PidFileError {
    let _ = fs::remove_file(path);
    drop(file);
    tracing::error!("Failed to write pid file {}: {} failed: {}", path.display(), stage, source);
    PidFileError::new(path, stage, source)
}

/// Record the current process id in `path` and remove the file at exit.
///
/// `None` is a no-op. A previously written pid file is released (closed and
/// unlocked, but left on disk) before the new one is created, so at most one
/// file is removed at exit.
pub fn write_pid_file(path: Option<&Path>) -> Result<(), PidFileError> {
    let Some(path) = path else {
        return Ok(());
    };

    let mut owned = OWNED.lock();
    if let Some(previous) = owned.take() {
        tracing::debug!("Releasing pid file {}", previous.path().display());
    }

    let pid_file = PidFile::create(path)?;

    if let Err(e) = register_exit_hook() {
        let PidFile { path, file, .. } = pid_file;
        drop(file);
        return Err(rollback_registered(&path, e));
    }

    *owned = Some(pid_file);
    Ok(())
}

fn rollback_registered(path: &Path, source: io::Error) -> PidFileError {
    let _ = fs::remove_file(path);
    tracing::error!("Failed to register pid file cleanup for {}: {}", path.display(), source);
    PidFileError::new(path, "atexit", source)
}

/// Path of the pid file that will be removed at exit.
pub fn owned_pid_file() -> Option<PathBuf> {
    OWNED.lock().as_ref().map(|p| p.path().to_path_buf())
}

/// Remove the owned pid file, as the exit hook does.
///
/// Returns `true` if a file was removed.
pub fn cleanup_pid_file() -> bool {
    cleanup_as(std::process::id())
}

fn cleanup_as(pid: u32) -> bool {
    let mut owned = OWNED.lock();
    if !owned.as_ref().is_some_and(|p| p.pid() == pid) {
        return false;
    }
    owned.take().is_some_and(|p| p.remove_as(pid))
}

#[cfg(unix)]
extern "C" fn exit_hook() {
    cleanup_pid_file();
}

#[cfg(unix)]
fn register_exit_hook() -> io::Result<()> {
    if EXIT_HOOK_REGISTERED.load(Ordering::Acquire) {
        return Ok(());
    }
    // SAFETY: exit_hook is a plain extern "C" function with no arguments.
    if unsafe { libc::atexit(exit_hook) } != 0 {
        return Err(io::Error::other("atexit registration failed"));
    }
    EXIT_HOOK_REGISTERED.store(true, Ordering::Release);
    Ok(())
}

#[cfg(not(unix))]
fn register_exit_hook() -> io::Result<()> {
    EXIT_HOOK_REGISTERED.store(true, Ordering::Release);
    Ok(())
}
