//! Objectives and their running normalization bounds.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Direction;

/// A named metric recorded for every trial.
///
/// `lower` and `upper` are running bounds: unless locked, they widen to
/// cover every observed cost. They are used to normalize costs into
/// `[0, 1]` and to impute missing costs with the worst value.
///
/// Serialized with the fields `name`, `lower`, `upper`, `lock_lower`,
/// `lock_upper` and `optimize` (`"lower"` or `"upper"`).
///
/// # Examples
///
/// ```
/// use runstore::{Direction, Objective};
///
/// let accuracy = Objective::new("accuracy", 0.0, 1.0).maximize().lock_lower().lock_upper();
/// assert_eq!(accuracy.direction(), Direction::Maximize);
/// assert_eq!(accuracy.worst(), 0.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    name: String,
    lower: f64,
    upper: f64,
    #[serde(default)]
    lock_lower: bool,
    #[serde(default)]
    lock_upper: bool,
    #[serde(rename = "optimize", default)]
    direction: Direction,
}

impl Objective {
    /// An objective minimized within the initial range `[lower, upper]`.
    #[must_use]
    pub fn new(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            lock_lower: false,
            lock_upper: false,
            direction: Direction::Minimize,
        }
    }

    /// Prefer higher values.
    #[must_use]
    pub fn maximize(mut self) -> Self {
        self.direction = Direction::Maximize;
        self
    }

    /// Set the direction explicitly.
    #[must_use]
    pub fn direction_of(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Keep the lower bound fixed regardless of observed costs.
    #[must_use]
    pub fn lock_lower(mut self) -> Self {
        self.lock_lower = true;
        self
    }

    /// Keep the upper bound fixed regardless of observed costs.
    #[must_use]
    pub fn lock_upper(mut self) -> Self {
        self.lock_upper = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    #[must_use]
    pub fn is_lower_locked(&self) -> bool {
        self.lock_lower
    }

    #[must_use]
    pub fn is_upper_locked(&self) -> bool {
        self.lock_upper
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The worst value within the current bounds.
    #[must_use]
    pub fn worst(&self) -> f64 {
        match self.direction {
            Direction::Minimize => self.upper,
            Direction::Maximize => self.lower,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.lower > self.upper || self.lower.is_nan() || self.upper.is_nan() {
            return Err(Error::InvalidBounds {
                low: self.lower,
                high: self.upper,
            });
        }
        Ok(())
    }

    /// Widen unlocked bounds to include `cost`.
    pub(crate) fn observe(&mut self, cost: f64) {
        if !self.lock_lower && cost < self.lower {
            trace_debug!(objective = %self.name, lower = cost, "lower bound widened");
            self.lower = cost;
        }
        if !self.lock_upper && cost > self.upper {
            trace_debug!(objective = %self.name, upper = cost, "upper bound widened");
            self.upper = cost;
        }
    }

    /// Map `cost` into `[0, 1]` where `0` is best.
    ///
    /// Costs outside the bounds map outside `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateObjective`] when `upper == lower`.
    #[allow(clippy::float_cmp)]
    pub fn normalize(&self, cost: f64) -> Result<f64> {
        let range = self.upper - self.lower;
        if range == 0.0 {
            return Err(Error::DegenerateObjective {
                name: self.name.clone(),
            });
        }
        let normalized = (cost - self.lower) / range;
        Ok(match self.direction {
            Direction::Minimize => normalized,
            Direction::Maximize => 1.0 - normalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_widen_unless_locked() {
        let mut free = Objective::new("cost", 0.0, 1.0);
        free.observe(-0.5);
        free.observe(2.0);
        free.observe(0.5);
        assert_eq!((free.lower(), free.upper()), (-0.5, 2.0));

        let mut pinned = Objective::new("cost", 0.0, 1.0).lock_lower().lock_upper();
        pinned.observe(-0.5);
        pinned.observe(2.0);
        assert_eq!((pinned.lower(), pinned.upper()), (0.0, 1.0));
    }

    #[test]
    fn normalization_flips_for_maximize() {
        let min = Objective::new("loss", 0.0, 4.0);
        let max = Objective::new("acc", 0.0, 4.0).maximize();
        assert_eq!(min.normalize(1.0).unwrap(), 0.25);
        assert_eq!(max.normalize(1.0).unwrap(), 0.75);
    }

    #[test]
    fn zero_width_range_is_an_error() {
        let flat = Objective::new("cost", 1.0, 1.0);
        assert!(matches!(
            flat.normalize(1.0),
            Err(Error::DegenerateObjective { .. })
        ));
    }

    #[test]
    fn worst_depends_on_direction() {
        assert_eq!(Objective::new("a", -1.0, 3.0).worst(), 3.0);
        assert_eq!(Objective::new("a", -1.0, 3.0).maximize().worst(), -1.0);
    }

    #[test]
    fn serde_field_names() {
        let json = serde_json::to_value(Objective::new("time", 0.0, 10.0).lock_lower()).unwrap();
        assert_eq!(json["optimize"], "lower");
        assert_eq!(json["lock_lower"], true);
        assert_eq!(json["upper"], 10.0);
    }
}
