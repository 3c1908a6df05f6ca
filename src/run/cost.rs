//! Cost imputation, aggregation and the views derived from them.

use core::ops::Index;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Run;
use crate::error::{Error, Result};
use crate::space::Configuration;
use crate::trial::ConfigId;
use crate::types::{Budget, Status};

/// One step of the incumbent trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// The new best cost.
    pub cost: f64,
    /// End time of the trial that reached it.
    pub time: f64,
    /// Position of that trial in [`Run::history`].
    pub trial_index: usize,
}

/// Imputed costs per configuration, in order of first appearance.
///
/// Inserting a configuration again replaces its costs but keeps its
/// position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CostTable {
    rows: Vec<(ConfigId, Vec<f64>)>,
    index: HashMap<ConfigId, usize>,
}

impl CostTable {
    fn insert(&mut self, id: ConfigId, costs: Vec<f64>) {
        if let Some(&slot) = self.index.get(&id) {
            self.rows[slot].1 = costs;
        } else {
            self.index.insert(id, self.rows.len());
            self.rows.push((id, costs));
        }
    }

    #[must_use]
    pub fn get(&self, id: ConfigId) -> Option<&[f64]> {
        self.index.get(&id).map(|&slot| self.rows[slot].1.as_slice())
    }

    #[must_use]
    pub fn contains_key(&self, id: ConfigId) -> bool {
        self.index.contains_key(&id)
    }

    /// Configuration ids in table order.
    pub fn keys(&self) -> impl Iterator<Item = ConfigId> + '_ {
        self.rows.iter().map(|(id, _)| *id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Index<ConfigId> for CostTable {
    type Output = [f64];

    fn index(&self, id: ConfigId) -> &[f64] {
        &self.rows[self.index[&id]].1
    }
}

impl FromIterator<(ConfigId, Vec<f64>)> for CostTable {
    fn from_iter<I: IntoIterator<Item = (ConfigId, Vec<f64>)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (id, costs) in iter {
            table.insert(id, costs);
        }
        table
    }
}

impl<'a> IntoIterator for &'a CostTable {
    type Item = &'a (ConfigId, Vec<f64>);
    type IntoIter = core::slice::Iter<'a, (ConfigId, Vec<f64>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for CostTable {
    type Item = (ConfigId, Vec<f64>);
    type IntoIter = std::vec::IntoIter<(ConfigId, Vec<f64>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl Run {
    /// Replace every unobserved cost with its objective's worst bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CostDimensionMismatch`] when `costs` is not aligned
    /// with the run's objectives.
    pub fn process_costs(&self, costs: &[Option<f64>]) -> Result<Vec<f64>> {
        self.check_len(costs.len())?;
        Ok(self.impute(costs))
    }

    fn impute(&self, costs: &[Option<f64>]) -> Vec<f64> {
        costs
            .iter()
            .zip(&self.meta.objectives)
            .map(|(cost, objective)| cost.unwrap_or_else(|| objective.worst()))
            .collect()
    }

    fn check_len(&self, got: usize) -> Result<()> {
        let expected = self.meta.objectives.len();
        if got == expected {
            Ok(())
        } else {
            Err(Error::CostDimensionMismatch { expected, got })
        }
    }

    /// Reduce a cost vector to one scalar.
    ///
    /// With a single selected objective and `normalize == false` the
    /// imputed cost of that objective is returned unchanged. Otherwise each
    /// selected cost is normalized into `[0, 1]` (flipped for maximized
    /// objectives), weighted by `1 / n` where `n` counts *all* objectives of
    /// the run, and the weighted values are averaged over the selection.
    ///
    /// `objectives` selects by name; `None` selects every objective.
    ///
    /// # Errors
    ///
    /// - [`Error::CostDimensionMismatch`] for a misaligned cost vector.
    /// - [`Error::UnknownObjective`] for a name the run does not have.
    /// - [`Error::DegenerateObjective`] when a selected objective has a
    ///   zero-width range and normalization is needed.
    pub fn calculate_cost(
        &self,
        costs: &[Option<f64>],
        objectives: Option<&[&str]>,
        normalize: bool,
    ) -> Result<f64> {
        let processed = self.process_costs(costs)?;
        let selected = self.selection(objectives)?;
        self.combine(&processed, &selected, normalize)
    }

    pub(crate) fn combine(
        &self,
        processed: &[f64],
        selected: &[usize],
        normalize: bool,
    ) -> Result<f64> {
        if let [single] = selected {
            if !normalize {
                return Ok(processed[*single]);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let weight = 1.0 / self.meta.objectives.len() as f64;
        let mut total = 0.0;
        for &i in selected {
            total += self.meta.objectives[i].normalize(processed[i])? * weight;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = total / selected.len() as f64;
        Ok(mean)
    }

    /// Imputed costs per configuration.
    ///
    /// `budget` defaults to the highest known budget; trials at
    /// [`Budget::FULL`] always pass the budget filter. `statuses`, when
    /// given, keeps only trials with one of those statuses. Configurations
    /// are ordered by their first matching trial in history; when one has
    /// several matching trials the later one's costs win.
    #[must_use]
    pub fn costs(&self, budget: Option<Budget>, statuses: Option<&[Status]>) -> CostTable {
        let target = budget.or_else(|| self.highest_budget());
        self.history
            .iter()
            .filter(|t| t.budget().is_full() || target.is_none_or(|b| b == t.budget()))
            .filter(|t| statuses.is_none_or(|s| s.contains(&t.status())))
            .map(|t| (t.config_id(), self.impute(t.costs())))
            .collect()
    }

    /// The configuration with the lowest normalized cost.
    ///
    /// Ties keep the configuration seen first in [`costs`](Self::costs)
    /// order. Returns `Ok(None)`
    /// when no trial matches.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownObjective`] or [`Error::DegenerateObjective`], as for
    /// [`calculate_cost`](Self::calculate_cost).
    pub fn min_cost(
        &self,
        objectives: Option<&[&str]>,
        budget: Option<Budget>,
        statuses: Option<&[Status]>,
    ) -> Result<Option<(f64, &Configuration)>> {
        let selected = self.selection(objectives)?;
        let mut best: Option<(f64, ConfigId)> = None;

        for (id, costs) in self.costs(budget, statuses) {
            let cost = self.combine(&costs, &selected, true)?;
            if cost < best.map_or(f64::INFINITY, |(c, _)| c) {
                best = Some((cost, id));
            }
        }

        match best {
            Some((cost, id)) => Ok(Some((cost, self.config(id)?))),
            None => Ok(None),
        }
    }

    /// The incumbent trajectory at `budget` (default: highest budget).
    ///
    /// Trials recorded at exactly that budget are ordered by end time
    /// (stable) and a point is emitted whenever the unnormalized cost
    /// strictly improves on the best so far.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownObjective`] or [`Error::DegenerateObjective`], as for
    /// [`calculate_cost`](Self::calculate_cost).
    pub fn trajectory(
        &self,
        objectives: Option<&[&str]>,
        budget: Option<Budget>,
    ) -> Result<Vec<TrajectoryPoint>> {
        let selected = self.selection(objectives)?;
        let Some(target) = budget.or_else(|| self.highest_budget()) else {
            return Ok(Vec::new());
        };

        let mut order: Vec<usize> = (0..self.history.len())
            .filter(|&i| self.history[i].budget() == target)
            .collect();
        order.sort_by(|&a, &b| {
            self.history[a]
                .end_time()
                .total_cmp(&self.history[b].end_time())
        });

        let mut points = Vec::new();
        let mut current = f64::INFINITY;
        for index in order {
            let trial = &self.history[index];
            let cost = self.combine(&self.impute(trial.costs()), &selected, false)?;
            if cost < current {
                current = cost;
                points.push(TrajectoryPoint {
                    cost,
                    time: trial.end_time(),
                    trial_index: index,
                });
            }
        }

        trace_debug!(budget = %target, points = points.len(), "trajectory computed");
        Ok(points)
    }
}
