use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use super::Run;
use crate::error::{Error, Result};
use crate::objective::Objective;
use crate::space::ConfigSpace;
use crate::storage::RunFiles;

/// Meta keys owned by the run itself.
const RESERVED_META: [&str; 2] = ["objectives", "budgets"];

/// Builder for creating or reopening a [`Run`].
///
/// # Examples
///
/// ```
/// use runstore::prelude::*;
///
/// let space = ConfigSpace::builder().add(IntHp::new("layers", 1, 8)).build().unwrap();
/// let run = Run::builder()
///     .space(space)
///     .objective(Objective::new("loss", 0.0, 1.0))
///     .objective(Objective::new("time", 0.0, 0.0).lock_lower())
///     .meta("ram", 16)
///     .build()
///     .unwrap();
///
/// assert_eq!(run.objective_names(), vec!["loss", "time"]);
/// assert_eq!(run.meta().extra()["ram"], 16);
/// ```
#[derive(Debug, Default)]
pub struct RunBuilder {
    space: Option<ConfigSpace>,
    objectives: Vec<Objective>,
    extra: BTreeMap<String, Value>,
    path: Option<PathBuf>,
}

impl RunBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn space(mut self, space: ConfigSpace) -> Self {
        self.space = Some(space);
        self
    }

    /// Append one objective.
    #[must_use]
    pub fn objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    /// Append several objectives.
    #[must_use]
    pub fn objectives(mut self, objectives: impl IntoIterator<Item = Objective>) -> Self {
        self.objectives.extend(objectives);
        self
    }

    /// Attach a free-form metadata field. `objectives` and `budgets` are
    /// managed by the run and ignored here.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !RESERVED_META.contains(&key.as_str()) {
            self.extra.insert(key, value.into());
        }
        self
    }

    /// Bind the run to a directory.
    ///
    /// If the directory already holds a saved run, [`build`](Self::build)
    /// loads it and ignores the space, objectives and metadata given here.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Create the run.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingConfigSpace`] if no space was given and no saved run
    ///   exists at the path.
    /// - [`Error::NoObjectives`] / [`Error::InvalidBounds`] for a fresh run
    ///   with no or invalid objectives.
    /// - Any load error when reopening a saved run.
    pub fn build(self) -> Result<Run> {
        let files = self.path.as_ref().map(RunFiles::bind).transpose()?;
        if let Some(files) = &files {
            if files.exists() {
                return Run::load(files.dir());
            }
        }

        let space = self.space.ok_or(Error::MissingConfigSpace)?;
        let mut run = Run::fresh(space, self.objectives, self.extra)?;
        run.files = files;
        Ok(run)
    }
}
