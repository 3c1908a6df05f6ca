//! Tabular analyses over a [`Run`](crate::Run).
//!
//! Each analysis is a pure function from a run (and its inputs) to plain
//! data: rows, statistics and bar series ready for whatever presents them.
//!
//! | Analysis | Output |
//! |----------|--------|
//! | [`overview`] | Metadata, objective bounds and per-budget status counts |
//! | [`configurations`] | The configuration space as rows plus the best configuration |
//! | [`importance`] | Per-budget hyperparameter importance from an [`ImportanceEvaluator`] |

mod configurations;
mod importance;
mod overview;

pub use configurations::{BestConfig, Configurations, SpaceRow, configurations};
pub use importance::{
    BudgetBars, Importance, ImportanceConfig, ImportanceEvaluator, ImportanceReport, Statistics,
    importance,
};
pub use overview::{BudgetStatistics, ObjectiveRow, Overview, overview};
