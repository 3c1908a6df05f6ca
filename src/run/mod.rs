//! The run store: configurations, objectives and trial history of one optimization run.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::objective::Objective;
use crate::space::{ConfigSpace, Configuration};
use crate::storage::RunFiles;
use crate::trial::{ConfigId, Observation, Trial, TrialKey};
use crate::types::Budget;

mod builder;
mod cost;
mod encode;
mod persistence;

pub use builder::RunBuilder;
pub use cost::{CostTable, TrajectoryPoint};
pub use encode::{EncodedConfigs, EncodedFrame};

/// Name reported for a cost that combines several objectives.
pub const COMBINED_COST: &str = "Combined Cost";

/// An objective whose cost is derived from the trial's wall time when not reported.
const TIME_OBJECTIVE: &str = "time";

/// Run metadata persisted as `meta.json`.
///
/// `objectives` and `budgets` are maintained by the run; any other field
/// is free-form and round-trips untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    objectives: Vec<Objective>,
    #[serde(default)]
    budgets: Vec<Budget>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl Meta {
    /// Objectives with their current bounds.
    #[must_use]
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Known budgets in ascending order ([`Budget::FULL`] last).
    #[must_use]
    pub fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    /// Free-form fields such as `ram` or `cores`.
    #[must_use]
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

/// A recorded optimization run.
///
/// The run exclusively owns its configuration space, objectives (whose
/// bounds evolve with observed costs), deduplicated configurations,
/// origins and trial history. It changes only through [`add`](Self::add)
/// and is written to disk only by [`save`](Self::save).
///
/// A run is not internally synchronized. Share it across threads through
/// [`SharedRun`](crate::SharedRun) so that writers are exclusive.
///
/// # Examples
///
/// ```
/// use runstore::prelude::*;
///
/// let space = ConfigSpace::builder().add(FloatHp::new("x", -5.0, 5.0)).build().unwrap();
/// let mut run = Run::new(space, vec![Objective::new("loss", 0.0, 1.0)]).unwrap();
///
/// let config = Configuration::new().with("x", 0.5);
/// let first = run.add(Observation::new(vec![Some(0.8)], config.clone()).budget(1.0)).unwrap();
/// let again = run.add(Observation::new(vec![Some(0.3)], config).budget(1.0)).unwrap();
///
/// // Same configuration and budget: the trial is replaced, not appended.
/// assert_eq!(first, again);
/// assert_eq!(run.history().len(), 1);
/// assert_eq!(run.history()[0].costs(), &[Some(0.3)]);
/// ```
#[derive(Clone, Debug)]
pub struct Run {
    space: ConfigSpace,
    meta: Meta,
    configs: BTreeMap<ConfigId, Configuration>,
    config_ids: HashMap<String, ConfigId>,
    origins: BTreeMap<ConfigId, Option<String>>,
    models: HashMap<TrialKey, Value>,
    history: Vec<Trial>,
    trial_keys: HashMap<TrialKey, usize>,
    files: Option<RunFiles>,
}

impl Run {
    /// Create a builder for a new or existing run.
    #[must_use]
    pub fn builder() -> RunBuilder {
        RunBuilder::new()
    }

    /// Create an empty, unbound run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoObjectives`] for an empty objective list and
    /// [`Error::InvalidBounds`] when an objective has `lower > upper`.
    pub fn new(space: ConfigSpace, objectives: Vec<Objective>) -> Result<Self> {
        Self::fresh(space, objectives, BTreeMap::new())
    }

    pub(crate) fn fresh(
        space: ConfigSpace,
        objectives: Vec<Objective>,
        extra: BTreeMap<String, Value>,
    ) -> Result<Self> {
        if objectives.is_empty() {
            return Err(Error::NoObjectives);
        }
        objectives.iter().try_for_each(Objective::validate)?;

        Ok(Self {
            space,
            meta: Meta {
                objectives,
                budgets: Vec::new(),
                extra,
            },
            configs: BTreeMap::new(),
            config_ids: HashMap::new(),
            origins: BTreeMap::new(),
            models: HashMap::new(),
            history: Vec::new(),
            trial_keys: HashMap::new(),
            files: None,
        })
    }

    /// Record a trial.
    ///
    /// The configuration is validated against the space and deduplicated
    /// by value: the first occurrence gets the next id. Missing costs of an
    /// objective named `"time"` are derived as `end_time - start_time`.
    /// Unlocked objective bounds widen to include every observed cost. A
    /// trial whose `(config_id, budget)` is already recorded replaces the
    /// old one in place.
    ///
    /// On error the run is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::CostDimensionMismatch`] when the number of costs differs
    ///   from the number of objectives.
    /// - [`Error::NonFiniteCost`] for an infinite or NaN cost, including a
    ///   derived `"time"` cost.
    /// - [`Error::NonFiniteBudget`] for an infinite or NaN budget.
    /// - The configuration validation errors of [`ConfigSpace::normalize`].
    pub fn add(&mut self, observation: Observation) -> Result<TrialKey> {
        let expected = self.meta.objectives.len();
        if observation.costs.len() != expected {
            return Err(Error::CostDimensionMismatch {
                expected,
                got: observation.costs.len(),
            });
        }
        let config = self.space.normalize(&observation.config)?;
        let config_key = canonical_key(&config)?;

        let costs: Vec<Option<f64>> = observation
            .costs
            .iter()
            .zip(&self.meta.objectives)
            .map(|(&cost, objective)| match cost {
                None if objective.name() == TIME_OBJECTIVE => {
                    Some(observation.end_time - observation.start_time)
                }
                other => other,
            })
            .collect();

        for (objective, cost) in self.meta.objectives.iter().zip(&costs) {
            if let Some(value) = cost.filter(|c| !c.is_finite()) {
                return Err(Error::NonFiniteCost {
                    objective: objective.name().to_string(),
                    value,
                });
            }
        }
        if let Some(value) = observation.budget.value().filter(|b| !b.is_finite()) {
            return Err(Error::NonFiniteBudget(value));
        }

        for (objective, cost) in self.meta.objectives.iter_mut().zip(&costs) {
            if let Some(cost) = *cost {
                objective.observe(cost);
            }
        }

        let config_id = match self.config_ids.get(&config_key) {
            Some(&id) => id,
            None => {
                let id = self.configs.len();
                trace_debug!(config_id = id, "configuration registered");
                self.config_ids.insert(config_key, id);
                self.configs.insert(id, config);
                self.origins.insert(id, observation.origin.clone());
                id
            }
        };

        let trial = Trial::new(config_id, &observation, costs);
        let key = trial.key();
        match self.trial_keys.get(&key) {
            Some(&index) => {
                trace_debug!(config_id, budget = %key.1, "trial overwritten");
                self.history[index] = trial;
            }
            None => {
                self.trial_keys.insert(key, self.history.len());
                self.history.push(trial);
            }
        }

        if let Err(pos) = self.meta.budgets.binary_search(&key.1) {
            self.meta.budgets.insert(pos, key.1);
        }

        match observation.model {
            Some(model) => {
                self.models.insert(key, model);
            }
            None => {
                self.models.remove(&key);
            }
        }

        Ok(key)
    }

    #[must_use]
    pub fn space(&self) -> &ConfigSpace {
        &self.space
    }

    #[must_use]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    #[must_use]
    pub fn objectives(&self) -> &[Objective] {
        &self.meta.objectives
    }

    #[must_use]
    pub fn objective_names(&self) -> Vec<&str> {
        self.meta.objectives.iter().map(Objective::name).collect()
    }

    /// Name of the cost described by `selection`: the objective's own name
    /// when exactly one objective is involved, [`COMBINED_COST`] otherwise.
    #[must_use]
    pub fn objective_name(&self, selection: Option<&[&str]>) -> String {
        match selection {
            Some([single]) => (*single).to_string(),
            Some(names) if !names.is_empty() => COMBINED_COST.to_string(),
            _ if self.meta.objectives.len() == 1 => self.meta.objectives[0].name().to_string(),
            _ => COMBINED_COST.to_string(),
        }
    }

    /// Indices of the selected objectives; `None` or an empty slice selects all.
    pub(crate) fn selection(&self, selection: Option<&[&str]>) -> Result<Vec<usize>> {
        match selection {
            Some(names) if !names.is_empty() => {
                let mut indices: Vec<usize> = names
                    .iter()
                    .map(|name| {
                        self.meta
                            .objectives
                            .iter()
                            .position(|o| o.name() == *name)
                            .ok_or_else(|| Error::UnknownObjective((*name).to_string()))
                    })
                    .collect::<Result<_>>()?;
                indices.sort_unstable();
                indices.dedup();
                Ok(indices)
            }
            _ => Ok((0..self.meta.objectives.len()).collect()),
        }
    }

    /// The configuration with id `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConfig`] for an unknown id.
    pub fn config(&self, id: ConfigId) -> Result<&Configuration> {
        self.configs.get(&id).ok_or(Error::UnknownConfig(id))
    }

    /// The id of a configuration equal to `config`, if recorded.
    #[must_use]
    pub fn config_id(&self, config: &Configuration) -> Option<ConfigId> {
        let normalized = self.space.normalize(config).ok()?;
        let key = canonical_key(&normalized).ok()?;
        self.config_ids.get(&key).copied()
    }

    /// All recorded configurations by id.
    #[must_use]
    pub fn configs(&self) -> &BTreeMap<ConfigId, Configuration> {
        &self.configs
    }

    /// Configurations of the trials in history order, optionally only those at `budget`.
    #[must_use]
    pub fn configs_at(&self, budget: Option<Budget>) -> Vec<&Configuration> {
        self.history
            .iter()
            .filter(|t| budget.is_none_or(|b| b == t.budget()))
            .filter_map(|t| self.configs.get(&t.config_id()))
            .collect()
    }

    /// Where configuration `id` came from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConfig`] for an unknown id.
    pub fn origin(&self, id: ConfigId) -> Result<Option<&str>> {
        self.origins
            .get(&id)
            .map(Option::as_deref)
            .ok_or(Error::UnknownConfig(id))
    }

    #[must_use]
    pub fn origins(&self) -> &BTreeMap<ConfigId, Option<String>> {
        &self.origins
    }

    /// The budget at position `index` of the sorted budget list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownBudget`] when `index` is out of range.
    pub fn budget(&self, index: usize) -> Result<Budget> {
        self.meta
            .budgets
            .get(index)
            .copied()
            .ok_or(Error::UnknownBudget(index))
    }

    /// Known budgets in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoBudgets`] before the first trial is recorded.
    pub fn budgets(&self) -> Result<&[Budget]> {
        if self.meta.budgets.is_empty() {
            return Err(Error::NoBudgets);
        }
        Ok(&self.meta.budgets)
    }

    /// Human-readable budgets: `"None"` or the value rounded to two decimals.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoBudgets`] before the first trial is recorded.
    pub fn budget_labels(&self) -> Result<Vec<String>> {
        Ok(self.budgets()?.iter().map(|b| b.label()).collect())
    }

    /// The highest known budget, if any.
    #[must_use]
    pub fn highest_budget(&self) -> Option<Budget> {
        self.meta.budgets.last().copied()
    }

    /// Trials in insertion order.
    #[must_use]
    pub fn history(&self) -> &[Trial] {
        &self.history
    }

    #[must_use]
    pub fn trial(&self, key: TrialKey) -> Option<&Trial> {
        self.trial_keys.get(&key).map(|&i| &self.history[i])
    }

    /// The in-memory model artifact recorded with a trial.
    #[must_use]
    pub fn model(&self, key: TrialKey) -> Option<&Value> {
        self.models.get(&key)
    }

    /// Whether no trial has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The directory the run is bound to.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.files.as_ref().map(RunFiles::dir)
    }

    #[must_use]
    pub fn files(&self) -> Option<&RunFiles> {
        self.files.as_ref()
    }

    /// Bind the run to `dir`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns a [`Storage`](Error::Storage) error if the directory cannot be created.
    pub fn set_path(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        self.files = Some(RunFiles::bind(dir)?);
        Ok(())
    }
}

/// Stable string form of a canonical configuration, used for deduplication.
fn canonical_key(config: &Configuration) -> Result<String> {
    serde_json::to_string(config).map_err(|e| Error::Storage(e.to_string()))
}
