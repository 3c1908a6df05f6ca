use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::{Meta, Run, canonical_key};
use crate::error::{Error, Result};
use crate::objective::Objective;
use crate::space::{ConfigSpace, Configuration};
use crate::storage::{RunFiles, read_json, read_lines, write_json, write_lines};
use crate::trial::{ConfigId, Trial};

impl Run {
    /// Whether the run is bound to a directory that holds all five artifacts.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.files.as_ref().is_some_and(RunFiles::exists)
    }

    /// Write the run to its bound directory.
    ///
    /// Every artifact is written to a temporary sibling and renamed into
    /// place while an exclusive lock on the directory is held. Model
    /// artifacts are not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPath`] for an unbound run and a
    /// [`Storage`](Error::Storage) error if any write fails.
    pub fn save(&self) -> Result<()> {
        let files = self.files.as_ref().ok_or(Error::NoPath)?;
        let _lock = files.lock_exclusive()?;

        write_json(&files.configspace(), &self.space)?;
        write_json(&files.meta(), &self.meta)?;
        write_json(&files.configs(), &self.configs)?;
        write_json(&files.origins(), &self.origins)?;
        write_lines(&files.history(), &self.history)?;

        trace_info!(
            path = %files.dir().display(),
            configs = self.configs.len(),
            trials = self.history.len(),
            "run saved"
        );
        Ok(())
    }

    /// Bind the run to `dir` and save it there.
    ///
    /// # Errors
    ///
    /// As for [`set_path`](Self::set_path) and [`save`](Self::save).
    pub fn save_to(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        self.set_path(dir)?;
        self.save()
    }

    /// Load a saved run from `dir`.
    ///
    /// The loaded run stays bound to `dir`. Models are not restored.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] naming the first missing artifact.
    /// - [`Storage`](Error::Storage) for unreadable or malformed artifacts,
    ///   including out-of-range status values and trials that refer to
    ///   unknown configurations or have the wrong number of costs.
    /// - [`Error::NoObjectives`] / [`Error::InvalidBounds`] for invalid
    ///   objectives in `meta.json`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let files = RunFiles::at(dir);
        if let Some(path) = files.missing() {
            return Err(Error::NotFound { path });
        }

        let (space, meta, configs, origins, history) = {
            let _lock = files.lock_shared()?;
            (
                read_json::<ConfigSpace>(&files.configspace())?,
                read_json::<Meta>(&files.meta())?,
                read_json::<BTreeMap<ConfigId, Configuration>>(&files.configs())?,
                read_json::<BTreeMap<ConfigId, Option<String>>>(&files.origins())?,
                read_lines::<Trial>(&files.history())?,
            )
        };

        if meta.objectives.is_empty() {
            return Err(Error::NoObjectives);
        }
        meta.objectives.iter().try_for_each(Objective::validate)?;

        let mut config_ids = HashMap::with_capacity(configs.len());
        for (&id, config) in &configs {
            config_ids.insert(canonical_key(config)?, id);
        }

        let mut trial_keys = HashMap::with_capacity(history.len());
        for (index, trial) in history.iter().enumerate() {
            if !configs.contains_key(&trial.config_id()) {
                return Err(Error::storage(
                    &files.history(),
                    format!("trial {index} refers to unknown config {}", trial.config_id()),
                ));
            }
            if trial.costs().len() != meta.objectives.len() {
                return Err(Error::storage(
                    &files.history(),
                    format!(
                        "trial {index} has {} costs, expected {}",
                        trial.costs().len(),
                        meta.objectives.len()
                    ),
                ));
            }
            trial_keys.insert(trial.key(), index);
        }

        trace_info!(
            path = %files.dir().display(),
            configs = configs.len(),
            trials = history.len(),
            "run loaded"
        );

        Ok(Self {
            space,
            meta,
            configs,
            config_ids,
            origins,
            models: HashMap::new(),
            history,
            trial_keys,
            files: Some(files),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::parameter::IntHp;
    use crate::trial::Observation;

    fn temp_dir() -> PathBuf {
        use core::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        std::env::temp_dir().join(format!(
            "runstore_persist_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ))
    }

    fn run() -> Run {
        let space = ConfigSpace::builder().add(IntHp::new("x", 0, 9)).build().unwrap();
        let mut run = Run::new(space, vec![Objective::new("cost", 0.0, 1.0)]).unwrap();
        run.add(Observation::new(vec![Some(0.5)], Configuration::new().with("x", 3)))
            .unwrap();
        run
    }

    #[test]
    fn unbound_save_fails() {
        assert!(matches!(run().save(), Err(Error::NoPath)));
        assert!(!run().exists());
    }

    #[test]
    fn load_reports_missing_artifact() {
        let dir = temp_dir();
        let err = Run::load(&dir).unwrap_err();
        assert!(matches!(err, Error::NotFound { path } if path == dir.join("meta.json")));
        assert!(!dir.exists());
    }

    #[test]
    fn save_then_exists() {
        let dir = temp_dir();
        let mut run = run();
        run.save_to(&dir).unwrap();
        assert!(run.exists());
        assert_eq!(run.path(), Some(dir.as_path()));
        assert!(!dir.join(".history.jsonl.tmp").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_dangling_config_reference() {
        let dir = temp_dir();
        let mut run = run();
        run.save_to(&dir).unwrap();
        fs::write(dir.join("history.jsonl"), "[7,null,[0.1],0.0,1.0,1,{}]\n").unwrap();
        let err = Run::load(&dir).unwrap_err();
        assert!(err.to_string().contains("unknown config 7"), "{err}");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_bad_status() {
        let dir = temp_dir();
        let mut run = run();
        run.save_to(&dir).unwrap();
        fs::write(dir.join("history.jsonl"), "[0,null,[0.1],0.0,1.0,42,{}]\n").unwrap();
        assert!(matches!(Run::load(&dir), Err(Error::Storage(_))));
        fs::remove_dir_all(&dir).ok();
    }
}
