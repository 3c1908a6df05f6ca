#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! File-backed store for hyperparameter-optimization runs.
//!
//! A [`Run`] records the configurations an optimizer tried and the trials
//! that evaluated them, keeps running bounds for every [`Objective`], and
//! derives the views that downstream analysis needs: per-configuration
//! costs, the incumbent trajectory, the best configuration, and numeric
//! design matrices for tree-based importance models.
//!
//! # Getting Started
//!
//! ```
//! use runstore::prelude::*;
//!
//! let space = ConfigSpace::builder()
//!     .add(IntHp::new("x", 0, 10))
//!     .build()
//!     .unwrap();
//!
//! let mut run = Run::builder()
//!     .space(space)
//!     .objective(Objective::new("cost", 0.0, 1.0))
//!     .build()
//!     .unwrap();
//!
//! let config = Configuration::new().with("x", 1);
//! run.add(Observation::new(vec![Some(0.5)], config).budget(1.0).end_time(1.0))
//!     .unwrap();
//!
//! let (cost, best) = run.min_cost(None, None, None).unwrap().unwrap();
//! assert_eq!(best.get("x"), Some(&ParamValue::Int(1)));
//! assert!((cost - 0.5).abs() < 1e-12);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Run`] | Owns the configuration space, objectives, configurations, origins and trial history. |
//! | [`Trial`] | One recorded evaluation of a configuration at a budget. |
//! | [`Objective`] | A named metric with a direction and running normalization bounds. |
//! | [`ConfigSpace`] | Hyperparameter domains and conditional relations. |
//! | [`Configuration`] | One assignment of values to hyperparameters. |
//!
//! # On-disk layout
//!
//! A run bound to a directory persists five artifacts: `meta.json`,
//! `configspace.json`, `configs.json`, `origins.json` and `history.jsonl`.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) when trials are recorded and runs are saved or loaded | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod analysis;
mod cache;
mod condition;
mod error;
mod objective;
mod param;
pub mod parameter;
pub mod queue;
mod run;
mod space;
mod storage;
mod trial;
mod types;

pub use cache::{RunCache, SharedRun};
pub use condition::Condition;
pub use error::{Error, Result};
pub use objective::Objective;
pub use param::ParamValue;
pub use run::{
    COMBINED_COST, CostTable, EncodedConfigs, EncodedFrame, Meta, Run, RunBuilder, TrajectoryPoint,
};
pub use space::{ConfigSpace, ConfigSpaceBuilder, Configuration};
pub use storage::RunFiles;
pub use trial::{ConfigId, Observation, Trial, TrialKey};
pub use types::{Budget, Direction, Status};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use runstore::prelude::*;
/// ```
pub mod prelude {
    pub use crate::condition::Condition;
    pub use crate::error::{Error, Result};
    pub use crate::objective::Objective;
    pub use crate::param::ParamValue;
    pub use crate::parameter::{
        CategoricalHp, ConstantHp, FloatHp, Hyperparameter, IntHp, NormalHp, OrdinalHp,
    };
    pub use crate::run::{Run, RunBuilder};
    pub use crate::space::{ConfigSpace, Configuration};
    pub use crate::trial::{Observation, Trial};
    pub use crate::types::{Budget, Direction, Status};
}
