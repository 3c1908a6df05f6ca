#![allow(clippy::cast_precision_loss, clippy::float_cmp)]

mod invariants;
mod scenarios;
mod trajectory;

use runstore::prelude::*;

/// `x` in `0..=4`, `c` in `{a, b}`, `depth` active only when `c == "b"`.
pub(crate) fn space() -> ConfigSpace {
    ConfigSpace::builder()
        .add(IntHp::new("x", 0, 4))
        .add(CategoricalHp::new("c", ["a", "b"]))
        .add(IntHp::new("depth", 1, 3))
        .condition(Condition::equals("depth", "c", "b"))
        .build()
        .unwrap()
}

pub(crate) fn random_config(rng: &mut fastrand::Rng) -> Configuration {
    let config = Configuration::new().with("x", rng.i64(0..=4));
    if rng.bool() {
        config.with("c", "a")
    } else {
        config.with("c", "b").with("depth", rng.i64(1..=3))
    }
}

pub(crate) fn random_budget(rng: &mut fastrand::Rng) -> Budget {
    match rng.usize(0..3) {
        0 => Budget::new(1.0),
        1 => Budget::new(3.0),
        _ => Budget::FULL,
    }
}
