//! Conditions that activate a hyperparameter depending on a parent's value.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::space::Configuration;

/// A condition on a child hyperparameter.
///
/// Serialized in the ConfigSpace JSON layout, e.g.
/// `{"type": "EQ", "child": "gamma", "parent": "kernel", "value": "rbf"}`.
/// Conjunctions nest other conditions on the same child and are written
/// with that child as well, e.g.
/// `{"type": "AND", "child": "c", "conditions": [...]}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Condition {
    #[serde(rename = "EQ")]
    Equals {
        child: String,
        parent: String,
        value: ParamValue,
    },
    #[serde(rename = "NE")]
    NotEquals {
        child: String,
        parent: String,
        value: ParamValue,
    },
    #[serde(rename = "LT")]
    LessThan {
        child: String,
        parent: String,
        value: ParamValue,
    },
    #[serde(rename = "GT")]
    GreaterThan {
        child: String,
        parent: String,
        value: ParamValue,
    },
    #[serde(rename = "IN")]
    In {
        child: String,
        parent: String,
        values: Vec<ParamValue>,
    },
    #[serde(rename = "AND")]
    And { conditions: Vec<Condition> },
    #[serde(rename = "OR")]
    Or { conditions: Vec<Condition> },
}

impl Condition {
    /// `child` is active when `parent == value`.
    #[must_use]
    pub fn equals(
        child: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        Condition::Equals {
            child: child.into(),
            parent: parent.into(),
            value: value.into(),
        }
    }

    /// `child` is active when `parent != value`.
    #[must_use]
    pub fn not_equals(
        child: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        Condition::NotEquals {
            child: child.into(),
            parent: parent.into(),
            value: value.into(),
        }
    }

    /// `child` is active when `parent < value`.
    #[must_use]
    pub fn less_than(
        child: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        Condition::LessThan {
            child: child.into(),
            parent: parent.into(),
            value: value.into(),
        }
    }

    /// `child` is active when `parent > value`.
    #[must_use]
    pub fn greater_than(
        child: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        Condition::GreaterThan {
            child: child.into(),
            parent: parent.into(),
            value: value.into(),
        }
    }

    /// `child` is active when `parent` is one of `values`.
    #[must_use]
    pub fn is_in<I, T>(child: impl Into<String>, parent: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        Condition::In {
            child: child.into(),
            parent: parent.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The hyperparameter this condition activates.
    ///
    /// For conjunctions this is the child of the first nested condition;
    /// `None` only for an empty conjunction.
    #[must_use]
    pub fn child(&self) -> Option<&str> {
        match self {
            Condition::Equals { child, .. }
            | Condition::NotEquals { child, .. }
            | Condition::LessThan { child, .. }
            | Condition::GreaterThan { child, .. }
            | Condition::In { child, .. } => Some(child),
            Condition::And { conditions } | Condition::Or { conditions } => {
                conditions.first().and_then(Condition::child)
            }
        }
    }

    /// Every parent referenced by this condition, in declaration order.
    pub(crate) fn parents(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_parents(&mut out);
        out
    }

    fn collect_parents<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Equals { parent, .. }
            | Condition::NotEquals { parent, .. }
            | Condition::LessThan { parent, .. }
            | Condition::GreaterThan { parent, .. }
            | Condition::In { parent, .. } => {
                if !out.contains(&parent.as_str()) {
                    out.push(parent);
                }
            }
            Condition::And { conditions } | Condition::Or { conditions } => {
                for c in conditions {
                    c.collect_parents(out);
                }
            }
        }
    }

    /// Check that the condition is well formed for a single child.
    pub(crate) fn validate(&self) -> Result<&str> {
        let child = self.child().ok_or_else(|| Error::InvalidCondition {
            child: String::new(),
            reason: "empty conjunction".to_string(),
        })?;
        self.check_child(child)?;
        Ok(child)
    }

    fn check_child(&self, expected: &str) -> Result<()> {
        match self {
            Condition::And { conditions } | Condition::Or { conditions } => {
                if conditions.is_empty() {
                    return Err(Error::InvalidCondition {
                        child: expected.to_string(),
                        reason: "empty conjunction".to_string(),
                    });
                }
                conditions.iter().try_for_each(|c| c.check_child(expected))
            }
            _ => match self.child() {
                Some(child) if child == expected => Ok(()),
                other => Err(Error::InvalidCondition {
                    child: expected.to_string(),
                    reason: format!(
                        "conjunction mixes children '{expected}' and '{}'",
                        other.unwrap_or_default()
                    ),
                }),
            },
        }
    }

    /// Evaluate against the values present in `config`.
    ///
    /// An absent parent never satisfies a condition.
    pub(crate) fn holds(&self, config: &Configuration) -> bool {
        match self {
            Condition::Equals { parent, value, .. } => {
                config.get(parent).is_some_and(|v| v.matches(value))
            }
            Condition::NotEquals { parent, value, .. } => {
                config.get(parent).is_some_and(|v| !v.matches(value))
            }
            Condition::LessThan { parent, value, .. } => {
                compare(config.get(parent), value).is_some_and(core::cmp::Ordering::is_lt)
            }
            Condition::GreaterThan { parent, value, .. } => {
                compare(config.get(parent), value).is_some_and(core::cmp::Ordering::is_gt)
            }
            Condition::In { parent, values, .. } => config
                .get(parent)
                .is_some_and(|v| values.iter().any(|c| v.matches(c))),
            Condition::And { conditions } => conditions.iter().all(|c| c.holds(config)),
            Condition::Or { conditions } => conditions.iter().any(|c| c.holds(config)),
        }
    }
}

/// Borrowed form of [`Condition`] that also writes `child` for conjunctions.
#[derive(Serialize)]
#[serde(tag = "type")]
enum Written<'a> {
    #[serde(rename = "EQ")]
    Equals {
        child: &'a str,
        parent: &'a str,
        value: &'a ParamValue,
    },
    #[serde(rename = "NE")]
    NotEquals {
        child: &'a str,
        parent: &'a str,
        value: &'a ParamValue,
    },
    #[serde(rename = "LT")]
    LessThan {
        child: &'a str,
        parent: &'a str,
        value: &'a ParamValue,
    },
    #[serde(rename = "GT")]
    GreaterThan {
        child: &'a str,
        parent: &'a str,
        value: &'a ParamValue,
    },
    #[serde(rename = "IN")]
    In {
        child: &'a str,
        parent: &'a str,
        values: &'a [ParamValue],
    },
    #[serde(rename = "AND")]
    And {
        #[serde(skip_serializing_if = "Option::is_none")]
        child: Option<&'a str>,
        conditions: &'a [Condition],
    },
    #[serde(rename = "OR")]
    Or {
        #[serde(skip_serializing_if = "Option::is_none")]
        child: Option<&'a str>,
        conditions: &'a [Condition],
    },
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let written = match self {
            Condition::Equals {
                child,
                parent,
                value,
            } => Written::Equals {
                child,
                parent,
                value,
            },
            Condition::NotEquals {
                child,
                parent,
                value,
            } => Written::NotEquals {
                child,
                parent,
                value,
            },
            Condition::LessThan {
                child,
                parent,
                value,
            } => Written::LessThan {
                child,
                parent,
                value,
            },
            Condition::GreaterThan {
                child,
                parent,
                value,
            } => Written::GreaterThan {
                child,
                parent,
                value,
            },
            Condition::In {
                child,
                parent,
                values,
            } => Written::In {
                child,
                parent,
                values,
            },
            Condition::And { conditions } => Written::And {
                child: self.child(),
                conditions,
            },
            Condition::Or { conditions } => Written::Or {
                child: self.child(),
                conditions,
            },
        };
        written.serialize(serializer)
    }
}

fn compare(actual: Option<&ParamValue>, bound: &ParamValue) -> Option<core::cmp::Ordering> {
    match (actual?.as_f64(), bound.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => None,
    }
}
