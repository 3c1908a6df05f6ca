//! Core types for recorded runs.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Which end of an objective's range is better.
///
/// Serialized as `"lower"` / `"upper"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Lower values are better.
    #[default]
    #[serde(rename = "lower")]
    Minimize,
    /// Higher values are better.
    #[serde(rename = "upper")]
    Maximize,
}

/// The outcome of a trial.
///
/// Persisted as the integers `1..=6` in declaration order. Deserializing
/// any other integer fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    /// The evaluation finished and reported its costs.
    Success,
    /// The evaluation ran out of time.
    Timeout,
    /// The evaluation ran out of memory.
    Memoryout,
    /// The evaluation crashed.
    Crashed,
    /// The evaluation was aborted.
    Aborted,
    /// The evaluation has not finished yet.
    Running,
}

impl Status {
    /// All statuses in their persisted order.
    pub const ALL: [Status; 6] = [
        Status::Success,
        Status::Timeout,
        Status::Memoryout,
        Status::Crashed,
        Status::Aborted,
        Status::Running,
    ];

    /// Upper-case name, as shown in run statistics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Timeout => "TIMEOUT",
            Status::Memoryout => "MEMORYOUT",
            Status::Crashed => "CRASHED",
            Status::Aborted => "ABORTED",
            Status::Running => "RUNNING",
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => 1,
            Status::Timeout => 2,
            Status::Memoryout => 3,
            Status::Crashed => 4,
            Status::Aborted => 5,
            Status::Running => 6,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> core::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Status::Success),
            2 => Ok(Status::Timeout),
            3 => Ok(Status::Memoryout),
            4 => Ok(Status::Crashed),
            5 => Ok(Status::Aborted),
            6 => Ok(Status::Running),
            other => Err(format!("invalid trial status {other}, expected 1..=6")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fidelity a configuration was evaluated at.
///
/// [`Budget::FULL`] (persisted as `null`) stands for full fidelity and
/// orders after every numeric budget, so it is the highest budget of any
/// run that contains it. Numeric budgets are ordered by [`f64::total_cmp`]
/// with `-0.0` treated as `0.0`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Budget(Option<f64>);

impl Budget {
    /// Full fidelity.
    pub const FULL: Budget = Budget(None);

    /// A numeric budget.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(Some(value + 0.0))
    }

    /// The numeric value, or `None` for [`Budget::FULL`].
    #[must_use]
    pub fn value(self) -> Option<f64> {
        self.0.map(|v| v + 0.0)
    }

    /// Whether this is [`Budget::FULL`].
    #[must_use]
    pub fn is_full(self) -> bool {
        self.0.is_none()
    }

    /// `"None"` for full fidelity, otherwise the value rounded to two decimals.
    #[must_use]
    pub fn label(self) -> String {
        match self.value() {
            None => "None".to_string(),
            Some(v) => {
                let rounded = (v * 100.0).round() / 100.0;
                if rounded.fract() == 0.0 && rounded.is_finite() {
                    format!("{rounded:.1}")
                } else {
                    format!("{rounded}")
                }
            }
        }
    }
}

impl PartialEq for Budget {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Budget {}

impl PartialOrd for Budget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Budget {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.value(), other.value()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.total_cmp(&b),
        }
    }
}

impl Hash for Budget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().map(f64::to_bits).hash(state);
    }
}

impl From<f64> for Budget {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<i32> for Budget {
    fn from(value: i32) -> Self {
        Self::new(f64::from(value))
    }
}

impl From<Option<f64>> for Budget {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::FULL, Self::new)
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            None => f.write_str("None"),
            Some(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_budget_sorts_last() {
        let mut budgets = vec![Budget::FULL, Budget::new(3.0), Budget::new(1.0)];
        budgets.sort();
        assert_eq!(budgets, vec![Budget::new(1.0), Budget::new(3.0), Budget::FULL]);
    }

    #[test]
    fn negative_zero_equals_zero() {
        assert_eq!(Budget::new(-0.0), Budget::new(0.0));
    }

    #[test]
    fn labels() {
        assert_eq!(Budget::FULL.label(), "None");
        assert_eq!(Budget::new(1.0).label(), "1.0");
        assert_eq!(Budget::new(1.0 / 3.0).label(), "0.33");
    }

    #[test]
    fn status_integers() {
        assert_eq!(u8::from(Status::Success), 1);
        assert_eq!(Status::try_from(6), Ok(Status::Running));
        assert!(Status::try_from(0).is_err());
        assert!(Status::try_from(7).is_err());
    }

    #[test]
    fn status_serde_rejects_out_of_range() {
        assert_eq!(serde_json::to_string(&Status::Crashed).unwrap(), "4");
        assert_eq!(serde_json::from_str::<Status>("2").unwrap(), Status::Timeout);
        assert!(serde_json::from_str::<Status>("9").is_err());
    }

    #[test]
    fn direction_serde() {
        assert_eq!(serde_json::to_string(&Direction::Minimize).unwrap(), "\"lower\"");
        assert_eq!(
            serde_json::from_str::<Direction>("\"upper\"").unwrap(),
            Direction::Maximize
        );
    }
}
