//! On-disk layout of a run directory.
//!
//! A bound run owns one directory holding five artifacts:
//!
//! | File | Contents |
//! |------|----------|
//! | `meta.json` | Objectives (with bounds), budgets and free-form metadata |
//! | `configspace.json` | The configuration space in ConfigSpace JSON layout |
//! | `configs.json` | Configuration id → configuration |
//! | `origins.json` | Configuration id → origin or `null` |
//! | `history.jsonl` | One trial per line |
//!
//! Every artifact is written to a temporary sibling and renamed into
//! place. Saving holds an exclusive `fs2` lock on `<dir>/.lock` and
//! loading a shared one, so another process never reads a half-written
//! set of artifacts.

mod journal;

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

pub(crate) use journal::{read_json, read_lines, write_json, write_lines};

use crate::error::{Error, Result};

const META: &str = "meta.json";
const CONFIGSPACE: &str = "configspace.json";
const CONFIGS: &str = "configs.json";
const ORIGINS: &str = "origins.json";
const HISTORY: &str = "history.jsonl";
const LOCK: &str = ".lock";

/// The artifact paths of a run directory.
///
/// Binding creates the directory if it does not exist yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunFiles {
    dir: PathBuf,
}

impl RunFiles {
    /// Paths under `dir` without touching the filesystem.
    pub(crate) fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub(crate) fn bind(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| Error::storage(&dir, e))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn meta(&self) -> PathBuf {
        self.dir.join(META)
    }

    #[must_use]
    pub fn configspace(&self) -> PathBuf {
        self.dir.join(CONFIGSPACE)
    }

    #[must_use]
    pub fn configs(&self) -> PathBuf {
        self.dir.join(CONFIGS)
    }

    #[must_use]
    pub fn origins(&self) -> PathBuf {
        self.dir.join(ORIGINS)
    }

    #[must_use]
    pub fn history(&self) -> PathBuf {
        self.dir.join(HISTORY)
    }

    /// All five artifact paths.
    #[must_use]
    pub fn artifacts(&self) -> [PathBuf; 5] {
        [
            self.meta(),
            self.configspace(),
            self.configs(),
            self.origins(),
            self.history(),
        ]
    }

    /// The first artifact that is not a regular file, if any.
    #[must_use]
    pub fn missing(&self) -> Option<PathBuf> {
        self.artifacts().into_iter().find(|p| !p.is_file())
    }

    /// Whether all five artifacts exist.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.missing().is_none()
    }

    pub(crate) fn lock_exclusive(&self) -> Result<DirLock> {
        DirLock::acquire(&self.dir.join(LOCK), true)
    }

    pub(crate) fn lock_shared(&self) -> Result<DirLock> {
        DirLock::acquire(&self.dir.join(LOCK), false)
    }
}

/// An advisory lock on a run directory, released on drop.
pub(crate) struct DirLock {
    file: File,
}

impl DirLock {
    fn acquire(path: &Path, exclusive: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| Error::storage(path, e))?;
        if exclusive {
            file.lock_exclusive()
        } else {
            file.lock_shared()
        }
        .map_err(|e| Error::storage(path, e))?;
        Ok(Self { file })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        // Closing the file releases the lock as well.
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        use core::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        std::env::temp_dir().join(format!(
            "runstore_files_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn bind_creates_directory() {
        let dir = temp_dir().join("nested");
        let files = RunFiles::bind(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(!files.exists());
        assert_eq!(files.missing(), Some(dir.join("meta.json")));
        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn exists_needs_all_five() {
        let dir = temp_dir();
        let files = RunFiles::bind(&dir).unwrap();
        for path in &files.artifacts()[..4] {
            fs::write(path, "{}").unwrap();
        }
        assert_eq!(files.missing(), Some(files.history()));
        fs::write(files.history(), "").unwrap();
        assert!(files.exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn shared_locks_coexist() {
        let dir = temp_dir();
        let files = RunFiles::bind(&dir).unwrap();
        let a = files.lock_shared().unwrap();
        let b = files.lock_shared().unwrap();
        drop((a, b));
        let _w = files.lock_exclusive().unwrap();
        fs::remove_dir_all(&dir).ok();
    }
}
