use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log scale is used with non-positive bounds.
    #[error("invalid log bounds: low must be positive for log scale")]
    InvalidLogBounds,

    /// Returned when a categorical or ordinal hyperparameter has no values.
    #[error("hyperparameter '{0}' has no choices")]
    EmptyChoices(String),

    /// Returned when two hyperparameters share a name.
    #[error("duplicate hyperparameter '{0}'")]
    DuplicateHyperparameter(String),

    /// Returned when a name does not belong to the configuration space.
    #[error("unknown hyperparameter '{0}'")]
    UnknownHyperparameter(String),

    /// Returned when a condition references unknown or mismatched hyperparameters.
    #[error("invalid condition on '{child}': {reason}")]
    InvalidCondition {
        /// The hyperparameter the condition activates.
        child: String,
        /// Why the condition was rejected.
        reason: String,
    },

    /// Returned when a configuration does not fit the configuration space.
    #[error("invalid configuration for '{name}': {reason}")]
    InvalidConfiguration {
        /// The offending hyperparameter.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Returned when the number of costs differs from the number of objectives.
    #[error("cost dimension mismatch: expected {expected} costs, got {got}")]
    CostDimensionMismatch {
        /// The number of objectives declared by the run.
        expected: usize,
        /// The number of costs supplied.
        got: usize,
    },

    /// Returned when a trial reports an infinite or NaN cost.
    #[error("cost {value} for objective '{objective}' is not finite")]
    NonFiniteCost {
        /// The objective the cost belongs to.
        objective: String,
        /// The rejected cost.
        value: f64,
    },

    /// Returned when a trial is recorded at an infinite or NaN budget.
    #[error("budget {0} is not finite; use the full budget instead")]
    NonFiniteBudget(f64),

    /// Returned when a run is built without a configuration space or a path to load from.
    #[error("a configuration space or a path to existing trials is required")]
    MissingConfigSpace,

    /// Returned when a fresh run is built without objectives.
    #[error("a run needs at least one objective")]
    NoObjectives,

    /// Returned when an objective name is not declared by the run.
    #[error("unknown objective '{0}'")]
    UnknownObjective(String),

    /// Returned when normalizing against an objective whose bounds coincide.
    #[error("objective '{name}' has a zero-width range and cannot be normalized")]
    DegenerateObjective {
        /// The objective name.
        name: String,
    },

    /// Returned when a configuration id is not known to the run.
    #[error("unknown configuration id {0}")]
    UnknownConfig(usize),

    /// Returned when a budget index is out of range.
    #[error("unknown budget index {0}")]
    UnknownBudget(usize),

    /// Returned when budgets are requested from a run that has none.
    #[error("the run has no budgets yet")]
    NoBudgets,

    /// Returned when loading from a directory that lacks a run artifact.
    #[error("run artifact not found: {}", path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// Returned when saving a run that is not bound to a directory.
    #[error("no path to save the run to")]
    NoPath,

    /// Returned when reading or writing run artifacts fails.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn storage(path: &std::path::Path, err: impl core::fmt::Display) -> Self {
        Error::Storage(format!("{}: {err}", path.display()))
    }
}
