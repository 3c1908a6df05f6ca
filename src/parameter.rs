//! Hyperparameter kinds of a [`ConfigSpace`](crate::ConfigSpace).
//!
//! Every kind knows its domain, how to validate and canonicalize a value
//! for that domain, and how the value is encoded numerically for design
//! matrices. The serialized form follows the ConfigSpace JSON layout: an
//! object with a `type` tag such as `"uniform_float"` or `"categorical"`.
//!
//! # Example
//!
//! ```
//! use runstore::parameter::{CategoricalHp, FloatHp, Hyperparameter};
//!
//! let lr: Hyperparameter = FloatHp::new("lr", 1e-5, 1e-1).log_scale().into();
//! let kind: Hyperparameter = CategoricalHp::new("kind", ["a", "b"]).into();
//! assert_eq!(lr.name(), "lr");
//! assert!(lr.is_log());
//! assert_eq!(kind.domain_label(), "a, b");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::param::ParamValue;

/// A bounded floating-point hyperparameter (`uniform_float`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatHp {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    #[serde(default)]
    pub log: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
}

impl FloatHp {
    #[must_use]
    pub fn new(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            log: false,
            default: None,
        }
    }

    /// Mark the hyperparameter as sampled on a log scale.
    #[must_use]
    pub fn log_scale(mut self) -> Self {
        self.log = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: f64) -> Self {
        self.default = Some(value);
        self
    }
}

/// A bounded integer hyperparameter (`uniform_int`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntHp {
    pub name: String,
    pub lower: i64,
    pub upper: i64,
    #[serde(default)]
    pub log: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
}

impl IntHp {
    #[must_use]
    pub fn new(name: impl Into<String>, lower: i64, upper: i64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            log: false,
            default: None,
        }
    }

    /// Mark the hyperparameter as sampled on a log scale.
    #[must_use]
    pub fn log_scale(mut self) -> Self {
        self.log = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: i64) -> Self {
        self.default = Some(value);
        self
    }
}

/// A normally distributed hyperparameter (`normal_float` / `normal_int`).
///
/// `lower` and `upper` optionally truncate the domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalHp {
    pub name: String,
    pub mu: f64,
    pub sigma: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(default)]
    pub log: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
}

impl NormalHp {
    #[must_use]
    pub fn new(name: impl Into<String>, mu: f64, sigma: f64) -> Self {
        Self {
            name: name.into(),
            mu,
            sigma,
            lower: None,
            upper: None,
            log: false,
            default: None,
        }
    }

    /// Truncate the domain to `[lower, upper]`.
    #[must_use]
    pub fn bounded(mut self, lower: f64, upper: f64) -> Self {
        self.lower = Some(lower);
        self.upper = Some(upper);
        self
    }

    /// Wrap as an integer-valued `normal_int` hyperparameter.
    #[must_use]
    pub fn into_int(self) -> Hyperparameter {
        Hyperparameter::NormalInt(self)
    }
}

/// An unordered set of choices (`categorical`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalHp {
    pub name: String,
    pub choices: Vec<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    #[serde(default, alias = "probabilities", skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
}

impl CategoricalHp {
    #[must_use]
    pub fn new<I, T>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        Self {
            name: name.into(),
            choices: choices.into_iter().map(Into::into).collect(),
            default: None,
            weights: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<ParamValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// An ordered sequence of values (`ordinal`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrdinalHp {
    pub name: String,
    pub sequence: Vec<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
}

impl OrdinalHp {
    #[must_use]
    pub fn new<I, T>(name: impl Into<String>, sequence: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        Self {
            name: name.into(),
            sequence: sequence.into_iter().map(Into::into).collect(),
            default: None,
        }
    }
}

/// A hyperparameter with exactly one value (`constant`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstantHp {
    pub name: String,
    pub value: ParamValue,
}

impl ConstantHp {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Any hyperparameter kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Hyperparameter {
    UniformFloat(FloatHp),
    UniformInt(IntHp),
    NormalFloat(NormalHp),
    NormalInt(NormalHp),
    Categorical(CategoricalHp),
    Ordinal(OrdinalHp),
    Constant(ConstantHp),
}

impl Hyperparameter {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Hyperparameter::UniformFloat(hp) => &hp.name,
            Hyperparameter::UniformInt(hp) => &hp.name,
            Hyperparameter::NormalFloat(hp) | Hyperparameter::NormalInt(hp) => &hp.name,
            Hyperparameter::Categorical(hp) => &hp.name,
            Hyperparameter::Ordinal(hp) => &hp.name,
            Hyperparameter::Constant(hp) => &hp.name,
        }
    }

    /// The declared default, or the first choice / constant value where ConfigSpace implies one.
    #[must_use]
    pub fn default_value(&self) -> Option<ParamValue> {
        match self {
            Hyperparameter::UniformFloat(hp) => hp.default.map(ParamValue::Float),
            Hyperparameter::UniformInt(hp) => hp.default.map(ParamValue::Int),
            Hyperparameter::NormalFloat(hp) | Hyperparameter::NormalInt(hp) => hp.default.clone(),
            Hyperparameter::Categorical(hp) => {
                hp.default.clone().or_else(|| hp.choices.first().cloned())
            }
            Hyperparameter::Ordinal(hp) => {
                hp.default.clone().or_else(|| hp.sequence.first().cloned())
            }
            Hyperparameter::Constant(hp) => Some(hp.value.clone()),
        }
    }

    #[must_use]
    pub fn is_log(&self) -> bool {
        match self {
            Hyperparameter::UniformFloat(hp) => hp.log,
            Hyperparameter::UniformInt(hp) => hp.log,
            Hyperparameter::NormalFloat(hp) | Hyperparameter::NormalInt(hp) => hp.log,
            Hyperparameter::Categorical(_)
            | Hyperparameter::Ordinal(_)
            | Hyperparameter::Constant(_) => false,
        }
    }

    /// Human-readable description of the possible values.
    #[must_use]
    pub fn domain_label(&self) -> String {
        match self {
            Hyperparameter::UniformFloat(hp) => format!("[{}, {}]", hp.lower, hp.upper),
            Hyperparameter::UniformInt(hp) => format!("[{}, {}]", hp.lower, hp.upper),
            Hyperparameter::NormalFloat(hp) | Hyperparameter::NormalInt(hp) => {
                match (hp.lower, hp.upper) {
                    (Some(lower), Some(upper)) => format!("[{lower}, {upper}]"),
                    _ => format!("N({}, {})", hp.mu, hp.sigma),
                }
            }
            Hyperparameter::Categorical(hp) => join(&hp.choices),
            Hyperparameter::Ordinal(hp) => join(&hp.sequence),
            Hyperparameter::Constant(hp) => hp.value.to_string(),
        }
    }

    /// Check the declaration itself.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Hyperparameter::UniformFloat(hp) => {
                check_bounds(hp.lower, hp.upper)?;
                check_log(hp.log, hp.lower)
            }
            Hyperparameter::UniformInt(hp) => {
                check_bounds(hp.lower as f64, hp.upper as f64)?;
                check_log(hp.log, hp.lower as f64)
            }
            Hyperparameter::NormalFloat(hp) | Hyperparameter::NormalInt(hp) => {
                match (hp.lower, hp.upper) {
                    (Some(lower), Some(upper)) => {
                        check_bounds(lower, upper)?;
                        check_log(hp.log, lower)
                    }
                    _ => Ok(()),
                }
            }
            Hyperparameter::Categorical(hp) if hp.choices.is_empty() => {
                Err(Error::EmptyChoices(hp.name.clone()))
            }
            Hyperparameter::Ordinal(hp) if hp.sequence.is_empty() => {
                Err(Error::EmptyChoices(hp.name.clone()))
            }
            Hyperparameter::Categorical(_)
            | Hyperparameter::Ordinal(_)
            | Hyperparameter::Constant(_) => Ok(()),
        }
    }

    /// Validate `value` against the domain and return its canonical form.
    ///
    /// Numbers are coerced to the kind's type (`Float` for float kinds,
    /// `Int` for integer kinds when integral), and choices are replaced by
    /// the declared choice they equal.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn canonicalize(&self, value: &ParamValue) -> Result<ParamValue> {
        let reject = |reason: String| Error::InvalidConfiguration {
            name: self.name().to_string(),
            reason,
        };

        match self {
            Hyperparameter::UniformFloat(hp) => {
                let v = number(value).ok_or_else(|| reject(format!("{value} is not a number")))?;
                if !(hp.lower..=hp.upper).contains(&v) {
                    return Err(reject(format!("{v} outside [{}, {}]", hp.lower, hp.upper)));
                }
                Ok(ParamValue::Float(v))
            }
            Hyperparameter::UniformInt(hp) => {
                let v = integer(value).ok_or_else(|| reject(format!("{value} is not an integer")))?;
                if !(hp.lower..=hp.upper).contains(&v) {
                    return Err(reject(format!("{v} outside [{}, {}]", hp.lower, hp.upper)));
                }
                Ok(ParamValue::Int(v))
            }
            Hyperparameter::NormalFloat(hp) => {
                let v = number(value).ok_or_else(|| reject(format!("{value} is not a number")))?;
                check_truncation(hp, v).map_err(reject)?;
                Ok(ParamValue::Float(v))
            }
            Hyperparameter::NormalInt(hp) => {
                let v = integer(value).ok_or_else(|| reject(format!("{value} is not an integer")))?;
                check_truncation(hp, v as f64).map_err(reject)?;
                Ok(ParamValue::Int(v))
            }
            Hyperparameter::Categorical(hp) => hp
                .choices
                .iter()
                .find(|c| c.matches(value))
                .cloned()
                .ok_or_else(|| reject(format!("{value} is not one of {}", join(&hp.choices)))),
            Hyperparameter::Ordinal(hp) => hp
                .sequence
                .iter()
                .find(|c| c.matches(value))
                .cloned()
                .ok_or_else(|| reject(format!("{value} is not one of {}", join(&hp.sequence)))),
            Hyperparameter::Constant(hp) => {
                if hp.value.matches(value) {
                    Ok(hp.value.clone())
                } else {
                    Err(reject(format!("expected constant {}", hp.value)))
                }
            }
        }
    }

    /// Numeric encoding of a canonical value.
    ///
    /// Choices encode as their index, numbers as themselves, constants as `0`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn encode(&self, value: &ParamValue) -> f64 {
        match self {
            Hyperparameter::UniformFloat(_)
            | Hyperparameter::UniformInt(_)
            | Hyperparameter::NormalFloat(_)
            | Hyperparameter::NormalInt(_) => value.as_f64().unwrap_or(f64::NAN),
            Hyperparameter::Categorical(hp) => position(&hp.choices, value),
            Hyperparameter::Ordinal(hp) => position(&hp.sequence, value),
            Hyperparameter::Constant(_) => 0.0,
        }
    }

    /// The placeholder an inactive value takes in a design matrix for tree models.
    ///
    /// Choices use one past their last index, numbers use `-1`, constants `1`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn inactive_tree_value(&self) -> f64 {
        match self {
            Hyperparameter::Categorical(hp) => hp.choices.len() as f64,
            Hyperparameter::Ordinal(hp) => hp.sequence.len() as f64,
            Hyperparameter::UniformFloat(_)
            | Hyperparameter::UniformInt(_)
            | Hyperparameter::NormalFloat(_)
            | Hyperparameter::NormalInt(_) => -1.0,
            Hyperparameter::Constant(_) => 1.0,
        }
    }
}

impl From<FloatHp> for Hyperparameter {
    fn from(hp: FloatHp) -> Self {
        Hyperparameter::UniformFloat(hp)
    }
}

impl From<IntHp> for Hyperparameter {
    fn from(hp: IntHp) -> Self {
        Hyperparameter::UniformInt(hp)
    }
}

impl From<NormalHp> for Hyperparameter {
    fn from(hp: NormalHp) -> Self {
        Hyperparameter::NormalFloat(hp)
    }
}

impl From<CategoricalHp> for Hyperparameter {
    fn from(hp: CategoricalHp) -> Self {
        Hyperparameter::Categorical(hp)
    }
}

impl From<OrdinalHp> for Hyperparameter {
    fn from(hp: OrdinalHp) -> Self {
        Hyperparameter::Ordinal(hp)
    }
}

impl From<ConstantHp> for Hyperparameter {
    fn from(hp: ConstantHp) -> Self {
        Hyperparameter::Constant(hp)
    }
}

fn check_bounds(low: f64, high: f64) -> Result<()> {
    if low > high || low.is_nan() || high.is_nan() {
        return Err(Error::InvalidBounds { low, high });
    }
    Ok(())
}

fn check_log(log: bool, low: f64) -> Result<()> {
    if log && low <= 0.0 {
        return Err(Error::InvalidLogBounds);
    }
    Ok(())
}

fn check_truncation(hp: &NormalHp, v: f64) -> core::result::Result<(), String> {
    if hp.lower.is_some_and(|lower| v < lower) || hp.upper.is_some_and(|upper| v > upper) {
        return Err(format!("{v} outside the truncated domain"));
    }
    Ok(())
}

fn number(value: &ParamValue) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integer(value: &ParamValue) -> Option<i64> {
    match value {
        ParamValue::Int(v) => Some(*v),
        ParamValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn position(values: &[ParamValue], value: &ParamValue) -> f64 {
    values
        .iter()
        .position(|c| c == value)
        .map_or(f64::NAN, |i| i as f64)
}

fn join(values: &[ParamValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_coerces_integers() {
        let hp: Hyperparameter = FloatHp::new("x", 0.0, 10.0).into();
        assert_eq!(hp.canonicalize(&ParamValue::Int(3)).unwrap(), ParamValue::Float(3.0));
        assert!(hp.canonicalize(&ParamValue::Float(11.0)).is_err());
        assert!(hp.canonicalize(&ParamValue::Str("3".into())).is_err());
    }

    #[test]
    fn int_rejects_fractions() {
        let hp: Hyperparameter = IntHp::new("n", 1, 5).into();
        assert_eq!(hp.canonicalize(&ParamValue::Float(2.0)).unwrap(), ParamValue::Int(2));
        assert!(hp.canonicalize(&ParamValue::Float(2.5)).is_err());
        assert!(hp.canonicalize(&ParamValue::Int(6)).is_err());
    }

    #[test]
    fn categorical_encodes_index() {
        let hp: Hyperparameter = CategoricalHp::new("c", ["a", "b", "c"]).into();
        let v = hp.canonicalize(&ParamValue::from("b")).unwrap();
        assert_eq!(hp.encode(&v), 1.0);
        assert_eq!(hp.inactive_tree_value(), 3.0);
        assert!(hp.canonicalize(&ParamValue::from("z")).is_err());
    }

    #[test]
    fn constant_and_numeric_tree_values() {
        let c: Hyperparameter = ConstantHp::new("k", "on").into();
        let f: Hyperparameter = FloatHp::new("x", 0.0, 1.0).into();
        assert_eq!(c.encode(&ParamValue::from("on")), 0.0);
        assert_eq!(c.inactive_tree_value(), 1.0);
        assert_eq!(f.inactive_tree_value(), -1.0);
    }

    #[test]
    fn invalid_declarations() {
        let bad: Hyperparameter = FloatHp::new("x", 2.0, 1.0).into();
        assert!(matches!(bad.validate(), Err(Error::InvalidBounds { .. })));
        let empty: Hyperparameter = CategoricalHp::new("c", Vec::<&str>::new()).into();
        assert!(matches!(empty.validate(), Err(Error::EmptyChoices(_))));
    }

    #[test]
    fn log_scale_needs_positive_lower_bound() {
        let zero: Hyperparameter = FloatHp::new("lr", 0.0, 1.0).log_scale().into();
        assert!(matches!(zero.validate(), Err(Error::InvalidLogBounds)));
        let negative: Hyperparameter = IntHp::new("n", -4, 4).log_scale().into();
        assert!(matches!(negative.validate(), Err(Error::InvalidLogBounds)));
        let linear: Hyperparameter = FloatHp::new("x", 0.0, 1.0).into();
        assert!(linear.validate().is_ok());

        let json = r#"{"name": "lr", "type": "uniform_float", "log": true, "lower": 0.0, "upper": 1.0}"#;
        let hp: Hyperparameter = serde_json::from_str(json).unwrap();
        assert!(matches!(hp.validate(), Err(Error::InvalidLogBounds)));
    }

    #[test]
    fn configspace_json_layout() {
        let json = r#"{"name": "lr", "type": "uniform_float", "log": true, "lower": 0.001, "upper": 1.0, "default": 0.01}"#;
        let hp: Hyperparameter = serde_json::from_str(json).unwrap();
        assert_eq!(hp.name(), "lr");
        assert!(hp.is_log());
        assert_eq!(hp.default_value(), Some(ParamValue::Float(0.01)));

        let cat = r#"{"name": "c", "type": "categorical", "choices": ["a", "b"], "default": "a", "probabilities": null}"#;
        let hp: Hyperparameter = serde_json::from_str(cat).unwrap();
        assert_eq!(hp.domain_label(), "a, b");
    }
}
