use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::run::Run;
use crate::types::{Budget, Status};

/// Summary of a run: metadata, objectives and status counts per budget.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overview {
    /// `(attribute, value)` for every metadata field except the objectives.
    pub meta: Vec<(String, String)>,
    pub objectives: Vec<ObjectiveRow>,
    /// One entry per known budget, ascending.
    pub statistics: Vec<BudgetStatistics>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectiveRow {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// How many trials at one budget ended in each status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetStatistics {
    pub budget: Budget,
    pub total: usize,
    counts: BTreeMap<Status, usize>,
}

impl BudgetStatistics {
    fn new(budget: Budget) -> Self {
        Self {
            budget,
            total: 0,
            counts: BTreeMap::new(),
        }
    }

    fn record(&mut self, status: Status) {
        *self.counts.entry(status).or_default() += 1;
        self.total += 1;
    }

    #[must_use]
    pub fn count(&self, status: Status) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Share of `status` in whole percent, rounded down.
    #[must_use]
    pub fn percentage(&self, status: Status) -> usize {
        if self.total == 0 {
            return 0;
        }
        self.count(status) * 100 / self.total
    }

    /// Table cell text, e.g. `"3 (75%)"`.
    #[must_use]
    pub fn cell(&self, status: Status) -> String {
        format!("{} ({}%)", self.count(status), self.percentage(status))
    }
}

/// Summarize `run`.
///
/// # Examples
///
/// ```
/// use runstore::analysis::overview;
/// use runstore::prelude::*;
///
/// let space = ConfigSpace::builder().add(IntHp::new("x", 0, 9)).build().unwrap();
/// let mut run = Run::builder()
///     .space(space)
///     .objective(Objective::new("cost", 0.0, 1.0))
///     .meta("ram", 8)
///     .build()
///     .unwrap();
/// for x in 0..4 {
///     let status = if x == 0 { Status::Crashed } else { Status::Success };
///     let config = Configuration::new().with("x", x);
///     run.add(Observation::new(vec![Some(0.5)], config).status(status)).unwrap();
/// }
///
/// let summary = overview(&run);
/// assert_eq!(summary.statistics[0].cell(Status::Success), "3 (75%)");
/// assert_eq!(summary.meta[1], ("ram".to_string(), "8".to_string()));
/// ```
#[must_use]
pub fn overview(run: &Run) -> Overview {
    let meta_info = run.meta();

    let mut meta = vec![(
        "budgets".to_string(),
        meta_info
            .budgets()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    )];
    meta.extend(
        meta_info
            .extra()
            .iter()
            .map(|(key, value)| (key.clone(), display_value(value))),
    );

    let objectives = run
        .objectives()
        .iter()
        .map(|o| ObjectiveRow {
            name: o.name().to_string(),
            lower: o.lower(),
            upper: o.upper(),
        })
        .collect();

    let mut stats: BTreeMap<Budget, BudgetStatistics> = meta_info
        .budgets()
        .iter()
        .map(|&b| (b, BudgetStatistics::new(b)))
        .collect();
    for trial in run.history() {
        stats
            .entry(trial.budget())
            .or_insert_with(|| BudgetStatistics::new(trial.budget()))
            .record(trial.status());
    }

    Overview {
        meta,
        objectives,
        statistics: stats.into_values().collect(),
    }
}

/// Strings as-is, lists joined with `", "`, everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
