//! Recorded trials and the observations they are built from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::space::Configuration;
use crate::types::{Budget, Status};

/// Identifier of a deduplicated configuration, assigned in first-seen order from `0`.
pub type ConfigId = usize;

/// Identity of a trial: the configuration and the budget it ran at.
pub type TrialKey = (ConfigId, Budget);

/// The persisted line layout of `history.jsonl`.
type TrialRecord = (
    ConfigId,
    Budget,
    Vec<Option<f64>>,
    f64,
    f64,
    Status,
    BTreeMap<String, Value>,
);

/// One recorded evaluation of a configuration at a budget.
///
/// Trials are immutable once recorded. `costs` is aligned with the run's
/// objectives; `None` entries were not observed and are imputed with the
/// objective's worst bound when read through a [`Run`](crate::Run).
///
/// In `history.jsonl` a trial is a JSON array of its seven fields in the
/// order `config_id, budget, costs, start_time, end_time, status, additional`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "TrialRecord", into = "TrialRecord")]
pub struct Trial {
    config_id: ConfigId,
    budget: Budget,
    costs: Vec<Option<f64>>,
    start_time: f64,
    end_time: f64,
    status: Status,
    additional: BTreeMap<String, Value>,
}

impl Trial {
    pub(crate) fn new(
        config_id: ConfigId,
        observation: &Observation,
        costs: Vec<Option<f64>>,
    ) -> Self {
        Self {
            config_id,
            budget: observation.budget,
            costs,
            start_time: round2(observation.start_time),
            end_time: round2(observation.end_time),
            status: observation.status,
            additional: observation.additional.clone(),
        }
    }

    #[must_use]
    pub fn config_id(&self) -> ConfigId {
        self.config_id
    }

    #[must_use]
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Raw costs as recorded, with `None` for unobserved entries.
    #[must_use]
    pub fn costs(&self) -> &[Option<f64>] {
        &self.costs
    }

    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn additional(&self) -> &BTreeMap<String, Value> {
        &self.additional
    }

    #[must_use]
    pub fn key(&self) -> TrialKey {
        (self.config_id, self.budget)
    }
}

impl From<TrialRecord> for Trial {
    fn from(
        (config_id, budget, costs, start_time, end_time, status, additional): TrialRecord,
    ) -> Self {
        Self {
            config_id,
            budget,
            costs,
            start_time,
            end_time,
            status,
            additional,
        }
    }
}

impl From<Trial> for TrialRecord {
    fn from(t: Trial) -> Self {
        (
            t.config_id,
            t.budget,
            t.costs,
            t.start_time,
            t.end_time,
            t.status,
            t.additional,
        )
    }
}

/// Everything needed to record one trial via [`Run::add`](crate::Run::add).
///
/// Defaults: full budget, times `0.0`, [`Status::Success`], no origin,
/// no model, no additional fields.
///
/// # Examples
///
/// ```
/// use runstore::{Configuration, Observation, Status};
///
/// let obs = Observation::new(vec![None], Configuration::new().with("x", 1))
///     .budget(3.0)
///     .times(10.0, 12.5)
///     .status(Status::Crashed)
///     .origin("random");
/// assert_eq!(obs.config().get("x").map(ToString::to_string).as_deref(), Some("1"));
/// ```
#[derive(Clone, Debug)]
pub struct Observation {
    pub(crate) costs: Vec<Option<f64>>,
    pub(crate) config: Configuration,
    pub(crate) budget: Budget,
    pub(crate) start_time: f64,
    pub(crate) end_time: f64,
    pub(crate) status: Status,
    pub(crate) origin: Option<String>,
    pub(crate) model: Option<Value>,
    pub(crate) additional: BTreeMap<String, Value>,
}

impl Observation {
    /// Costs aligned with the run's objectives (`None` = not observed).
    #[must_use]
    pub fn new(costs: Vec<Option<f64>>, config: Configuration) -> Self {
        Self {
            costs,
            config,
            budget: Budget::FULL,
            start_time: 0.0,
            end_time: 0.0,
            status: Status::Success,
            origin: None,
            model: None,
            additional: BTreeMap::new(),
        }
    }

    /// The fidelity of the evaluation; defaults to [`Budget::FULL`].
    ///
    /// Infinite budgets are rejected by [`Run::add`](crate::Run::add);
    /// full fidelity is [`Budget::FULL`].
    #[must_use]
    pub fn budget(mut self, budget: impl Into<Budget>) -> Self {
        self.budget = budget.into();
        self
    }

    #[must_use]
    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    #[must_use]
    pub fn end_time(mut self, end_time: f64) -> Self {
        self.end_time = end_time;
        self
    }

    /// Set start and end time together.
    #[must_use]
    pub fn times(self, start_time: f64, end_time: f64) -> Self {
        self.start_time(start_time).end_time(end_time)
    }

    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// How the configuration was produced. Only the first origin of a configuration is kept.
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// A model artifact for this trial, held in memory only.
    #[must_use]
    pub fn model(mut self, model: Value) -> Self {
        self.model = Some(model);
        self
    }

    /// Add one free-form field to the trial's `additional` record.
    #[must_use]
    pub fn additional(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }
}

fn round2(t: f64) -> f64 {
    (t * 100.0).round() / 100.0
}
