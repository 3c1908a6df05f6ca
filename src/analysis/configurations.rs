use serde::Serialize;

use crate::error::Result;
use crate::run::Run;
use crate::space::Configuration;

/// The configuration space as rows, plus the best configuration found.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Configurations {
    pub space: Vec<SpaceRow>,
    /// `None` for a run without trials.
    pub best: Option<BestConfig>,
}

/// One hyperparameter of the space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpaceRow {
    pub name: String,
    /// Bounds as `[lower, upper]` or choices joined with `", "`.
    pub values: String,
    /// `"None"` when the hyperparameter has no default.
    pub default: String,
    pub log: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BestConfig {
    /// Normalized cost over all objectives at the highest budget.
    pub cost: f64,
    pub config: Configuration,
}

impl BestConfig {
    /// `(hyperparameter, value)` rows in name order.
    #[must_use]
    pub fn rows(&self) -> Vec<(String, String)> {
        self.config
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

/// Describe the space of `run` and find its best configuration.
///
/// # Errors
///
/// [`Error::DegenerateObjective`](crate::Error::DegenerateObjective) when
/// an objective has a zero-width range.
pub fn configurations(run: &Run) -> Result<Configurations> {
    let space = run
        .space()
        .hyperparameters()
        .iter()
        .map(|hp| SpaceRow {
            name: hp.name().to_string(),
            values: hp.domain_label(),
            default: hp
                .default_value()
                .map_or_else(|| "None".to_string(), |v| v.to_string()),
            log: hp.is_log(),
        })
        .collect();

    let best = run
        .min_cost(None, None, None)?
        .map(|(cost, config)| BestConfig {
            cost,
            config: config.clone(),
        });

    Ok(Configurations { space, best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Objective;
    use crate::parameter::{CategoricalHp, FloatHp};
    use crate::space::ConfigSpace;
    use crate::trial::Observation;

    fn space() -> ConfigSpace {
        ConfigSpace::builder()
            .add(FloatHp::new("lr", 1e-4, 1.0).log_scale())
            .add(CategoricalHp::new("opt", ["adam", "sgd"]).default_value("sgd"))
            .build()
            .unwrap()
    }

    #[test]
    fn rows_and_best() {
        let mut run = Run::new(space(), vec![Objective::new("loss", 0.0, 1.0)]).unwrap();
        for (lr, opt, loss) in [(0.1, "adam", 0.6), (0.01, "sgd", 0.2), (0.5, "sgd", 0.9)] {
            let config = Configuration::new().with("lr", lr).with("opt", opt);
            run.add(Observation::new(vec![Some(loss)], config)).unwrap();
        }

        let out = configurations(&run).unwrap();
        assert_eq!(out.space[0].name, "lr");
        assert_eq!(out.space[0].values, "[0.0001, 1]");
        assert_eq!(out.space[0].default, "None");
        assert!(out.space[0].log);
        assert_eq!(out.space[1].values, "adam, sgd");
        assert_eq!(out.space[1].default, "sgd");

        let best = out.best.unwrap();
        assert!((best.cost - 0.2).abs() < 1e-12);
        assert_eq!(
            best.rows(),
            vec![
                ("lr".to_string(), "0.01".to_string()),
                ("opt".to_string(), "sgd".to_string())
            ]
        );
    }

    #[test]
    fn empty_run_has_no_best() {
        let run = Run::new(space(), vec![Objective::new("loss", 0.0, 1.0)]).unwrap();
        let out = configurations(&run).unwrap();
        assert_eq!(out.space.len(), 2);
        assert!(out.best.is_none());
    }
}
