//! Process-wide registry of loaded runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::run::Run;

/// A run shared between threads. Readers take the read lock; `add` and
/// `save` need the write lock.
pub type SharedRun = Arc<RwLock<Run>>;

/// Runs by name, loaded lazily from their directories.
///
/// # Examples
///
/// ```
/// use runstore::prelude::*;
/// use runstore::RunCache;
///
/// let cache = RunCache::new();
/// let space = ConfigSpace::builder().add(IntHp::new("x", 0, 3)).build().unwrap();
/// let run = Run::new(space, vec![Objective::new("cost", 0.0, 1.0)]).unwrap();
///
/// let shared = cache.insert("smac", run);
/// shared
///     .write()
///     .add(Observation::new(vec![Some(0.1)], Configuration::new().with("x", 2)))
///     .unwrap();
///
/// assert_eq!(cache.get("smac").unwrap().read().history().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RunCache {
    runs: RwLock<HashMap<String, SharedRun>>,
}

impl RunCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `run` under `name`, replacing any previous entry.
    pub fn insert(&self, name: impl Into<String>, run: Run) -> SharedRun {
        let shared = Arc::new(RwLock::new(run));
        self.runs.write().insert(name.into(), Arc::clone(&shared));
        shared
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<SharedRun> {
        self.runs.read().get(name).cloned()
    }

    /// The run registered under `name`, loading it from `dir` on first use.
    ///
    /// Loading happens outside the registry lock. If two threads race, the
    /// first run registered is kept and returned to both.
    ///
    /// # Errors
    ///
    /// Any error of [`Run::load`].
    pub fn get_or_load(&self, name: &str, dir: impl AsRef<Path>) -> Result<SharedRun> {
        if let Some(run) = self.get(name) {
            return Ok(run);
        }

        let run = Run::load(dir)?;
        trace_debug!(name, "run cached");
        let mut runs = self.runs.write();
        Ok(Arc::clone(
            runs.entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(run))),
        ))
    }

    pub fn remove(&self, name: &str) -> Option<SharedRun> {
        self.runs.write().remove(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.runs.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    pub fn clear(&self) {
        self.runs.write().clear();
    }
}
