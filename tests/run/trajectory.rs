use runstore::prelude::*;

use crate::{random_config, space};

#[test]
fn strictly_improving_over_time() {
    let mut rng = fastrand::Rng::with_seed(19);
    let mut run = Run::new(space(), vec![Objective::new("cost", 0.0, 1.0)]).unwrap();

    for _ in 0..200 {
        let end = rng.f64() * 100.0;
        let cost = (rng.f64() > 0.1).then(|| rng.f64());
        run.add(
            Observation::new(vec![cost], random_config(&mut rng))
                .budget(2.0)
                .times(0.0, end),
        )
        .unwrap();
    }

    let points = run.trajectory(None, None).unwrap();
    assert!(!points.is_empty());
    for pair in points.windows(2) {
        assert!(pair[1].cost < pair[0].cost);
        assert!(pair[1].time >= pair[0].time);
    }

    let best = run
        .history()
        .iter()
        .map(|t| t.costs()[0].unwrap_or(1.0))
        .fold(f64::INFINITY, f64::min);
    assert_eq!(points.last().unwrap().cost, best);

    for p in &points {
        assert_eq!(run.history()[p.trial_index].end_time(), p.time);
    }
}

#[test]
fn budget_selection_is_exact() {
    let mut run = Run::new(space(), vec![Objective::new("cost", 0.0, 1.0)]).unwrap();
    let cfg = |x: i64| Configuration::new().with("x", x).with("c", "a");
    run.add(Observation::new(vec![Some(0.4)], cfg(0)).budget(1.0).end_time(1.0))
        .unwrap();
    run.add(Observation::new(vec![Some(0.1)], cfg(1)).end_time(2.0))
        .unwrap();

    let at_one = run.trajectory(None, Some(Budget::new(1.0))).unwrap();
    assert_eq!(at_one.len(), 1);
    assert_eq!(at_one[0].cost, 0.4);

    let full = run.trajectory(None, None).unwrap();
    assert_eq!(full.len(), 1);
    assert_eq!(full[0].trial_index, 1);

    assert!(run.trajectory(None, Some(Budget::new(7.0))).unwrap().is_empty());
}

#[test]
fn selected_objective_by_name() {
    let mut run = Run::new(
        space(),
        vec![Objective::new("loss", 0.0, 1.0), Objective::new("time", 0.0, 10.0)],
    )
    .unwrap();
    let cfg = |x: i64| Configuration::new().with("x", x).with("c", "a");
    run.add(Observation::new(vec![Some(0.9), None], cfg(0)).times(0.0, 1.0))
        .unwrap();
    run.add(Observation::new(vec![Some(0.5), None], cfg(1)).times(1.0, 9.0))
        .unwrap();

    let by_time = run.trajectory(Some(&["time"]), None).unwrap();
    assert_eq!(by_time.len(), 1);
    assert_eq!(by_time[0].cost, 1.0);

    let by_loss = run.trajectory(Some(&["loss"]), None).unwrap();
    assert_eq!(by_loss.iter().map(|p| p.cost).collect::<Vec<_>>(), vec![0.9, 0.5]);

    assert!(matches!(
        run.trajectory(Some(&["memory"]), None),
        Err(Error::UnknownObjective(_))
    ));
}
