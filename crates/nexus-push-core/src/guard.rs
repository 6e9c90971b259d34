//! # Artifacts Directory Locking
//!
//! The host's artifact storage decides who may touch a build's artifacts
//! directory. [`ArtifactsGuard`] is that collaborator's interface; the scoped
//! helpers [`read_lock`] and [`write_lock`] pair every acquisition with a
//! release that runs on drop, so early returns and panics cannot leak a lock.
//!
//! [`DirectoryLocks`] is the in-process implementation: any number of readers
//! or a single writer per directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::{Condvar, Mutex};

/// Reader/writer locking keyed by artifacts directory.
pub trait ArtifactsGuard: Send + Sync {
    fn lock_reading(&self, dir: &Path);
    fn unlock_reading(&self, dir: &Path);
    fn lock_writing(&self, dir: &Path);
    fn unlock_writing(&self, dir: &Path);
}

/// Held read access to one directory.
#[must_use = "the read lock is released when this guard is dropped"]
pub struct ReadLock<'a> {
    guard: &'a dyn ArtifactsGuard,
    dir: PathBuf,
}

impl Drop for ReadLock<'_> {
    fn drop(&mut self) {
        self.guard.unlock_reading(&self.dir);
    }
}

/// Held write access to one directory.
#[must_use = "the write lock is released when this guard is dropped"]
pub struct WriteLock<'a> {
    guard: &'a dyn ArtifactsGuard,
    dir: PathBuf,
}

impl Drop for WriteLock<'_> {
    fn drop(&mut self) {
        self.guard.unlock_writing(&self.dir);
    }
}

/// Acquire read access to `dir` until the returned value is dropped.
pub fn read_lock<'a>(guard: &'a dyn ArtifactsGuard, dir: &Path) -> ReadLock<'a> {
    guard.lock_reading(dir);
    ReadLock {
        guard,
        dir: dir.to_path_buf(),
    }
}

/// Acquire write access to `dir` until the returned value is dropped.
pub fn write_lock<'a>(guard: &'a dyn ArtifactsGuard, dir: &Path) -> WriteLock<'a> {
    guard.lock_writing(dir);
    WriteLock {
        guard,
        dir: dir.to_path_buf(),
    }
}

#[derive(Debug, Default)]
struct DirState {
    readers: usize,
    writer: bool,
}

/// In-process [`ArtifactsGuard`]. Writers wait for all readers to leave.
#[derive(Debug, Default)]
pub struct DirectoryLocks {
    dirs: Mutex<HashMap<PathBuf, DirState>>,
    changed: Condvar,
}

impl DirectoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directories with at least one holder.
    pub fn held(&self) -> usize {
        self.dirs.lock().len()
    }
}

impl ArtifactsGuard for DirectoryLocks {
    fn lock_reading(&self, dir: &Path) {
        let mut dirs = self.dirs.lock();
        while dirs.get(dir).is_some_and(|s| s.writer) {
            self.changed.wait(&mut dirs);
        }
        dirs.entry(dir.to_path_buf()).or_default().readers += 1;
    }

    fn unlock_reading(&self, dir: &Path) {
        let mut dirs = self.dirs.lock();
        if let Some(state) = dirs.get_mut(dir) {
            state.readers = state.readers.saturating_sub(1);
            if state.readers == 0 && !state.writer {
                dirs.remove(dir);
            }
        }
        self.changed.notify_all();
    }

    fn lock_writing(&self, dir: &Path) {
        let mut dirs = self.dirs.lock();
        while dirs.get(dir).is_some_and(|s| s.writer || s.readers > 0) {
            self.changed.wait(&mut dirs);
        }
        dirs.entry(dir.to_path_buf()).or_default().writer = true;
    }

    fn unlock_writing(&self, dir: &Path) {
        let mut dirs = self.dirs.lock();
        if let Some(state) = dirs.get_mut(dir) {
            state.writer = false;
            if state.readers == 0 {
                dirs.remove(dir);
            }
        }
        self.changed.notify_all();
    }
}
