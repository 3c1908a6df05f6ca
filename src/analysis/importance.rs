use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::run::Run;
use crate::space::ConfigSpace;
use crate::types::Budget;

/// Raw statistics an evaluator reports for one hyperparameter group.
///
/// Index 1 is the mean importance and index 3 its standard deviation.
pub type Statistics = [f64; 4];

/// A variance-decomposition model such as fANOVA.
///
/// The evaluator receives a design matrix encoded for tree models (see
/// [`Run::encoded_configs`]) and reports statistics keyed by groups of
/// hyperparameter names. Only single-name groups are used.
pub trait ImportanceEvaluator {
    /// Fit on `x`/`y` and quantify the importance of every hyperparameter.
    ///
    /// # Errors
    ///
    /// Evaluator-specific.
    fn quantify(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        space: &ConfigSpace,
        n_trees: usize,
    ) -> Result<HashMap<Vec<String>, Statistics>>;
}

/// Settings for [`importance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceConfig {
    /// Trees in the evaluator's forest.
    pub n_trees: usize,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self { n_trees: 16 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Importance {
    pub mean: f64,
    pub std: f64,
}

/// Importance of each hyperparameter at each budget.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportanceReport {
    budgets: BTreeMap<Budget, BTreeMap<String, Importance>>,
}

/// One bar group: the importances at one budget in display order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetBars {
    pub budget: Budget,
    /// `(name, mean, std)`.
    pub bars: Vec<(String, f64, f64)>,
}

impl ImportanceReport {
    /// Budgets that have results, ascending.
    pub fn budgets(&self) -> impl Iterator<Item = Budget> + '_ {
        self.budgets.keys().copied()
    }

    #[must_use]
    pub fn at(&self, budget: Budget) -> Option<&BTreeMap<String, Importance>> {
        self.budgets.get(&budget)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty()
    }

    /// Grouped bars for the selected hyperparameters and budgets.
    ///
    /// Every group lists the hyperparameters in the same order: by
    /// descending mean importance at the last selected budget. An empty
    /// selection yields no groups.
    #[must_use]
    pub fn bars(&self, hyperparameters: &[&str], budgets: &[Budget]) -> Vec<BudgetBars> {
        let Some(last) = budgets.last() else {
            return Vec::new();
        };
        if hyperparameters.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<&str> = hyperparameters.to_vec();
        if let Some(reference) = self.budgets.get(last) {
            let mean = |name: &str| reference.get(name).map_or(f64::NEG_INFINITY, |i| i.mean);
            order.sort_by(|a, b| mean(*b).total_cmp(&mean(*a)));
        }

        budgets
            .iter()
            .filter_map(|budget| {
                let values = self.budgets.get(budget)?;
                let bars = order
                    .iter()
                    .filter_map(|&name| {
                        values
                            .get(name)
                            .map(|i| (name.to_string(), i.mean, i.std))
                    })
                    .collect();
                Some(BudgetBars {
                    budget: *budget,
                    bars,
                })
            })
            .collect()
    }
}

/// Quantify hyperparameter importance at every budget of `run`.
///
/// Budgets without any matching configuration are skipped, so an empty
/// run yields an empty report.
///
/// # Errors
///
/// Errors from encoding the run or from the evaluator.
pub fn importance(
    run: &Run,
    evaluator: &impl ImportanceEvaluator,
    config: ImportanceConfig,
) -> Result<ImportanceReport> {
    let mut report = ImportanceReport::default();

    for &budget in run.meta().budgets() {
        let encoded = run.encoded_configs(None, Some(budget), None, true)?;
        if encoded.is_empty() {
            continue;
        }

        let stats = evaluator.quantify(&encoded.x, &encoded.y, run.space(), config.n_trees)?;
        let per_hp: BTreeMap<String, Importance> = stats
            .into_iter()
            .filter_map(|(names, s)| match names.as_slice() {
                [name] => Some((
                    name.clone(),
                    Importance {
                        mean: s[1],
                        std: s[3],
                    },
                )),
                _ => None,
            })
            .collect();

        trace_debug!(budget = %budget, hyperparameters = per_hp.len(), "importance computed");
        report.budgets.insert(budget, per_hp);
    }

    Ok(report)
}
