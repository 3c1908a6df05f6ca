use std::collections::{HashMap, HashSet};

use runstore::ConfigId;
use runstore::prelude::*;

use crate::{random_budget, random_config, space};

const ADDS: usize = 300;

fn costs(rng: &mut fastrand::Rng) -> Vec<Option<f64>> {
    (0..2)
        .map(|_| (rng.f64() > 0.2).then(|| rng.f64() * 6.0 - 2.0))
        .collect()
}

fn two_objectives() -> Run {
    Run::new(
        space(),
        vec![
            Objective::new("loss", 0.0, 1.0),
            Objective::new("acc", 0.0, 1.0).maximize().lock_lower().lock_upper(),
        ],
    )
    .unwrap()
}

#[test]
fn equal_configs_share_ids() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut run = two_objectives();
    let mut seen: HashMap<String, ConfigId> = HashMap::new();

    for _ in 0..ADDS {
        let config = random_config(&mut rng);
        let (id, _) = run
            .add(Observation::new(costs(&mut rng), config.clone()).budget(random_budget(&mut rng)))
            .unwrap();
        let key = serde_json::to_string(&config).unwrap();
        assert_eq!(*seen.entry(key).or_insert(id), id);
        assert_eq!(run.config_id(&config), Some(id));
    }

    // Different configurations never share an id.
    let distinct: HashSet<ConfigId> = seen.values().copied().collect();
    assert_eq!(distinct.len(), seen.len());
    assert_eq!(run.configs().len(), seen.len());
    let ids: Vec<usize> = run.configs().keys().copied().collect();
    assert_eq!(ids, (0..seen.len()).collect::<Vec<_>>());
}

#[test]
fn history_has_one_trial_per_key() {
    let mut rng = fastrand::Rng::with_seed(11);
    let mut run = two_objectives();
    let mut keys = HashSet::new();

    for i in 0..ADDS {
        let obs = Observation::new(costs(&mut rng), random_config(&mut rng))
            .budget(random_budget(&mut rng))
            .end_time(i as f64);
        let key = run.add(obs).unwrap();
        keys.insert(key);
        assert_eq!(run.trial(key).unwrap().end_time(), i as f64);
    }

    assert_eq!(run.history().len(), keys.len());
    for trial in run.history() {
        assert!(keys.contains(&trial.key()));
    }
}

#[test]
fn unlocked_bounds_track_observed_extremes() {
    let mut rng = fastrand::Rng::with_seed(3);
    let mut run = two_objectives();
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);

    for _ in 0..ADDS {
        let costs = costs(&mut rng);
        if let Some(c) = costs[0] {
            lo = lo.min(c);
            hi = hi.max(c);
        }
        run.add(Observation::new(costs, random_config(&mut rng))).unwrap();
    }

    let loss = &run.objectives()[0];
    assert_eq!((loss.lower(), loss.upper()), (lo, hi));
    assert!(lo < 0.0 && hi > 1.0);

    let acc = &run.objectives()[1];
    assert_eq!((acc.lower(), acc.upper()), (0.0, 1.0));
}

#[test]
fn missing_costs_read_back_as_worst() {
    let mut rng = fastrand::Rng::with_seed(5);
    let mut run = two_objectives();
    for _ in 0..ADDS {
        run.add(Observation::new(costs(&mut rng), random_config(&mut rng)))
            .unwrap();
    }

    let loss_worst = run.objectives()[0].upper();
    let acc_worst = run.objectives()[1].lower();
    let table = run.costs(None, None);

    for trial in run.history() {
        let read = &table[trial.config_id()];
        for (slot, (raw, worst)) in trial.costs().iter().zip([loss_worst, acc_worst]).enumerate() {
            match raw {
                Some(c) => assert_eq!(read[slot], *c),
                None => assert_eq!(read[slot], worst),
            }
        }
    }
}
