use runstore::prelude::*;

fn run() -> Run {
    let space = ConfigSpace::builder().add(IntHp::new("x", 0, 10)).build().unwrap();
    Run::builder()
        .space(space)
        .objective(Objective::new("cost", 0.0, 1.0))
        .build()
        .unwrap()
}

fn x(v: i64) -> Configuration {
    Configuration::new().with("x", v)
}

#[test]
fn bounds_and_min_cost() {
    let mut run = run();

    let (id, _) = run
        .add(Observation::new(vec![Some(0.5)], x(1)).budget(1).end_time(1.0))
        .unwrap();
    assert_eq!(id, 0);
    assert_eq!((run.objectives()[0].lower(), run.objectives()[0].upper()), (0.0, 1.0));

    let (id, _) = run
        .add(Observation::new(vec![Some(-0.2)], x(2)).budget(1).end_time(2.0))
        .unwrap();
    assert_eq!(id, 1);
    assert_eq!(run.objectives()[0].lower(), -0.2);

    let (cost, config) = run.min_cost(None, None, None).unwrap().unwrap();
    assert_eq!(cost, 0.0);
    assert_eq!(config, &x(2));
}

#[test]
fn readding_a_key_overwrites() {
    let mut run = run();
    run.add(Observation::new(vec![Some(0.5)], x(1)).budget(1).end_time(1.0))
        .unwrap();
    run.add(Observation::new(vec![Some(-0.2)], x(2)).budget(1).end_time(2.0))
        .unwrap();

    run.add(Observation::new(vec![Some(0.9)], x(1)).budget(1).end_time(3.0))
        .unwrap();

    assert_eq!(run.history().len(), 2);
    assert_eq!(run.history()[0].costs(), &[Some(0.9)]);
    assert_eq!(run.history()[0].end_time(), 3.0);
    assert_eq!(run.costs(None, None)[0], vec![0.9]);
}

#[test]
fn maximized_objective_flips() {
    let space = ConfigSpace::builder().add(IntHp::new("x", 0, 10)).build().unwrap();
    let mut run = Run::new(space, vec![Objective::new("acc", 0.0, 1.0).maximize()]).unwrap();
    run.add(Observation::new(vec![Some(0.7)], x(1))).unwrap();
    run.add(Observation::new(vec![Some(0.9)], x(2))).unwrap();

    let (cost, best) = run.min_cost(None, None, None).unwrap().unwrap();
    assert!((cost - 0.1).abs() < 1e-12);
    assert_eq!(best, &x(2));
}

#[test]
fn crashed_trials_excluded_by_status() {
    let mut run = run();
    run.add(Observation::new(vec![None], x(1)).status(Status::Crashed))
        .unwrap();
    run.add(Observation::new(vec![Some(0.8)], x(2))).unwrap();

    let (_, best) = run.min_cost(None, None, None).unwrap().unwrap();
    assert_eq!(best, &x(2));

    let (cost, best) = run
        .min_cost(None, None, Some(&[Status::Crashed]))
        .unwrap()
        .unwrap();
    assert_eq!(best, &x(1));
    assert_eq!(cost, 1.0);
}
