//! Integration tests for the analyses over a recorded run.

use std::collections::HashMap;

use runstore::analysis::{
    ImportanceConfig, ImportanceEvaluator, Statistics, configurations, importance, overview,
};
use runstore::prelude::*;

/// Ranks hyperparameters by their column index, ignoring the data.
struct ByPosition;

impl ImportanceEvaluator for ByPosition {
    #[allow(clippy::cast_precision_loss)]
    fn quantify(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        space: &ConfigSpace,
        _n_trees: usize,
    ) -> Result<HashMap<Vec<String>, Statistics>> {
        assert_eq!(x.len(), y.len());
        assert!(x.iter().flatten().all(|v| v.is_finite()));
        Ok(space
            .names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| (vec![name.to_string()], [0.0, i as f64, 0.0, 0.5]))
            .collect())
    }
}

fn run() -> Run {
    let space = ConfigSpace::builder()
        .add(CategoricalHp::new("model", ["svm", "rf"]).default_value("rf"))
        .add(FloatHp::new("c", 0.01, 100.0).log_scale())
        .add(IntHp::new("trees", 10, 500))
        .condition(Condition::equals("c", "model", "svm"))
        .condition(Condition::equals("trees", "model", "rf"))
        .build()
        .unwrap();
    let mut run = Run::builder()
        .space(space)
        .objective(Objective::new("error", 0.0, 1.0))
        .meta("cores", 8)
        .build()
        .unwrap();

    let svm = |c: f64| Configuration::new().with("model", "svm").with("c", c);
    let rf = |t: i64| Configuration::new().with("model", "rf").with("trees", t);

    for (config, budget, error, status) in [
        (svm(1.0), 10.0, Some(0.3), Status::Success),
        (rf(100), 10.0, Some(0.25), Status::Success),
        (svm(10.0), 10.0, None, Status::Memoryout),
        (rf(100), 50.0, Some(0.12), Status::Success),
        (svm(1.0), 50.0, Some(0.2), Status::Success),
    ] {
        run.add(Observation::new(vec![error], config).budget(budget).status(status))
            .unwrap();
    }
    run
}

#[test]
fn overview_counts_statuses() {
    let summary = overview(&run());
    assert_eq!(summary.meta[0], ("budgets".to_string(), "10, 50".to_string()));
    assert_eq!(summary.meta[1], ("cores".to_string(), "8".to_string()));
    assert_eq!(summary.objectives[0].upper, 1.0);

    let low = &summary.statistics[0];
    assert_eq!(low.total, 3);
    assert_eq!(low.cell(Status::Success), "2 (66%)");
    assert_eq!(low.cell(Status::Memoryout), "1 (33%)");
    assert_eq!(low.cell(Status::Running), "0 (0%)");
    assert_eq!(summary.statistics[1].percentage(Status::Success), 100);
}

#[test]
fn configurations_reports_best_at_highest_budget() {
    let out = configurations(&run()).unwrap();
    let names: Vec<&str> = out.space.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["model", "c", "trees"]);
    assert_eq!(out.space[0].values, "svm, rf");
    assert_eq!(out.space[0].default, "rf");
    assert!(out.space[1].log);
    assert_eq!(out.space[2].values, "[10, 500]");

    let best = out.best.unwrap();
    assert!((best.cost - 0.12).abs() < 1e-12);
    assert_eq!(best.config.get("trees"), Some(&ParamValue::Int(100)));
}

#[test]
fn importance_per_budget() {
    let run = run();
    let report = importance(&run, &ByPosition, ImportanceConfig::default()).unwrap();
    let budgets: Vec<Budget> = report.budgets().collect();
    assert_eq!(budgets, vec![Budget::new(10.0), Budget::new(50.0)]);

    let groups = report.bars(&["model", "trees"], &budgets);
    assert_eq!(groups.len(), 2);
    for group in &groups {
        let names: Vec<&str> = group.bars.iter().map(|(n, _, _)| n.as_str()).collect();
        assert_eq!(names, vec!["trees", "model"]);
        assert_eq!(group.bars[0].2, 0.5);
    }
}

#[test]
fn analyses_on_empty_run() {
    let space = ConfigSpace::builder().add(IntHp::new("x", 0, 1)).build().unwrap();
    let run = Run::new(space, vec![Objective::new("cost", 0.0, 1.0)]).unwrap();

    assert!(overview(&run).statistics.is_empty());
    assert!(configurations(&run).unwrap().best.is_none());
    assert!(importance(&run, &ByPosition, ImportanceConfig::default()).unwrap().is_empty());
}
