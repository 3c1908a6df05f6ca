//! Numeric design matrices for downstream models.

use serde::{Deserialize, Serialize};

use super::Run;
use crate::error::Result;
use crate::trial::ConfigId;
use crate::types::{Budget, Status};

/// Encoded configurations paired with their scalar costs.
///
/// Row `i` of `x` is the encoding of configuration `config_ids[i]` in the
/// order of `columns`, and `y[i]` is its cost under the requested selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodedConfigs {
    /// Hyperparameter names, in configuration-space order.
    pub columns: Vec<String>,
    /// Name of the cost, see [`Run::objective_name`].
    pub cost_column: String,
    pub config_ids: Vec<ConfigId>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

/// Table form of [`EncodedConfigs`]: one row per configuration with the cost as the last column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodedFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl EncodedConfigs {
    #[must_use]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Join `x` and `y` into a single table.
    #[must_use]
    pub fn to_frame(&self) -> EncodedFrame {
        let mut columns = self.columns.clone();
        columns.push(self.cost_column.clone());

        let rows = self
            .x
            .iter()
            .zip(&self.y)
            .map(|(row, &cost)| {
                let mut row = row.clone();
                row.push(cost);
                row
            })
            .collect();

        EncodedFrame { columns, rows }
    }
}

impl Run {
    /// Encode every configuration that [`costs`](Self::costs) reports.
    ///
    /// Categorical and ordinal values become their index, numbers stay as
    /// they are, constants become `0`. Inactive hyperparameters are then
    /// imputed:
    ///
    /// - `for_tree == false`: every NaN becomes `-1`.
    /// - `for_tree == true`: a non-finite value of a conditional
    ///   hyperparameter becomes the choice count (categorical, ordinal),
    ///   `-1` (numeric) or `1` (constant). Other entries are left as is.
    ///
    /// Costs are unnormalized, see [`calculate_cost`](Self::calculate_cost).
    ///
    /// # Errors
    ///
    /// [`Error::UnknownObjective`](crate::Error::UnknownObjective) or
    /// [`Error::DegenerateObjective`](crate::Error::DegenerateObjective) from
    /// the cost aggregation, and [`Error::UnknownConfig`](crate::Error::UnknownConfig)
    /// if history refers to a configuration the run does not hold.
    pub fn encoded_configs(
        &self,
        objectives: Option<&[&str]>,
        budget: Option<Budget>,
        statuses: Option<&[Status]>,
        for_tree: bool,
    ) -> Result<EncodedConfigs> {
        let selected = self.selection(objectives)?;
        let hyperparameters = self.space.hyperparameters();

        let mut encoded = EncodedConfigs {
            columns: self.space.names().into_iter().map(str::to_string).collect(),
            cost_column: self.objective_name(objectives),
            ..EncodedConfigs::default()
        };

        for (id, costs) in self.costs(budget, statuses) {
            let mut row = self.space.encode(self.config(id)?);
            if for_tree {
                for (i, value) in row.iter_mut().enumerate() {
                    if self.space.is_conditional(i) && !value.is_finite() {
                        *value = hyperparameters[i].inactive_tree_value();
                    }
                }
            } else {
                for value in row.iter_mut().filter(|v| v.is_nan()) {
                    *value = -1.0;
                }
            }

            encoded.y.push(self.combine(&costs, &selected, false)?);
            encoded.x.push(row);
            encoded.config_ids.push(id);
        }

        Ok(encoded)
    }
}
