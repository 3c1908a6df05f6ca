//! Configuration spaces and the configurations drawn from them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::parameter::Hyperparameter;

/// One assignment of values to hyperparameters.
///
/// Equality is structural: two configurations are equal when they assign
/// equal values to the same names. Inactive hyperparameters are simply
/// absent.
///
/// # Examples
///
/// ```
/// use runstore::{Configuration, ParamValue};
///
/// let config = Configuration::new().with("lr", 0.01).with("kernel", "rbf");
/// assert_eq!(config.get("kernel"), Some(&ParamValue::from("rbf")));
/// assert_eq!(config.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, ParamValue>);

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Insert a value, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Iterate `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The interchange layout of `configspace.json`.
#[derive(Clone, Serialize, Deserialize)]
struct SpaceFile {
    hyperparameters: Vec<Hyperparameter>,
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    forbiddens: Vec<Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// A configuration space: ordered hyperparameters plus the conditions
/// that make some of them depend on others.
///
/// The space is parsed once; name lookups, parent lookups and the
/// conditions targeting a hyperparameter are precomputed. Forbidden
/// clauses are carried through serialization but not evaluated.
///
/// # Examples
///
/// ```
/// use runstore::parameter::{CategoricalHp, FloatHp};
/// use runstore::{Condition, ConfigSpace, Configuration};
///
/// let space = ConfigSpace::builder()
///     .add(CategoricalHp::new("kernel", ["linear", "rbf"]))
///     .add(FloatHp::new("gamma", 0.0, 1.0))
///     .condition(Condition::equals("gamma", "kernel", "rbf"))
///     .build()
///     .unwrap();
///
/// assert_eq!(space.parents_of("gamma"), ["kernel"]);
///
/// let linear = Configuration::new().with("kernel", "linear");
/// let encoded = space.encode(&space.normalize(&linear).unwrap());
/// assert_eq!(encoded[0], 0.0);
/// assert!(encoded[1].is_nan());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "SpaceFile", into = "SpaceFile")]
pub struct ConfigSpace {
    hyperparameters: Vec<Hyperparameter>,
    conditions: Vec<Condition>,
    forbiddens: Vec<Value>,
    extra: BTreeMap<String, Value>,
    index: HashMap<String, usize>,
    parents: Vec<Vec<String>>,
    conditions_of: Vec<Vec<usize>>,
}

impl ConfigSpace {
    /// Start building a space.
    #[must_use]
    pub fn builder() -> ConfigSpaceBuilder {
        ConfigSpaceBuilder::default()
    }

    /// Build a space from hyperparameters and conditions.
    ///
    /// # Errors
    ///
    /// Returns an error if a hyperparameter declaration is invalid, names
    /// repeat, or a condition references unknown hyperparameters.
    pub fn new(hyperparameters: Vec<Hyperparameter>, conditions: Vec<Condition>) -> Result<Self> {
        Self::assemble(hyperparameters, conditions, Vec::new(), BTreeMap::new())
    }

    fn assemble(
        hyperparameters: Vec<Hyperparameter>,
        conditions: Vec<Condition>,
        forbiddens: Vec<Value>,
        extra: BTreeMap<String, Value>,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(hyperparameters.len());
        for (i, hp) in hyperparameters.iter().enumerate() {
            hp.validate()?;
            if index.insert(hp.name().to_string(), i).is_some() {
                return Err(Error::DuplicateHyperparameter(hp.name().to_string()));
            }
        }

        let mut parents: Vec<Vec<String>> = vec![Vec::new(); hyperparameters.len()];
        let mut conditions_of: Vec<Vec<usize>> = vec![Vec::new(); hyperparameters.len()];
        for (ci, condition) in conditions.iter().enumerate() {
            let child = condition.validate()?;
            let &child_idx = index.get(child).ok_or_else(|| Error::InvalidCondition {
                child: child.to_string(),
                reason: "unknown child hyperparameter".to_string(),
            })?;
            for parent in condition.parents() {
                if !index.contains_key(parent) {
                    return Err(Error::InvalidCondition {
                        child: child.to_string(),
                        reason: format!("unknown parent '{parent}'"),
                    });
                }
                if parent == child {
                    return Err(Error::InvalidCondition {
                        child: child.to_string(),
                        reason: "a hyperparameter cannot be its own parent".to_string(),
                    });
                }
                if !parents[child_idx].iter().any(|p| p == parent) {
                    parents[child_idx].push(parent.to_string());
                }
            }
            conditions_of[child_idx].push(ci);
        }

        Ok(Self {
            hyperparameters,
            conditions,
            forbiddens,
            extra,
            index,
            parents,
            conditions_of,
        })
    }

    /// Hyperparameters in declaration order (the column order of encodings).
    #[must_use]
    pub fn hyperparameters(&self) -> &[Hyperparameter] {
        &self.hyperparameters
    }

    #[must_use]
    pub fn hyperparameter(&self, name: &str) -> Option<&Hyperparameter> {
        self.index_of(name).map(|i| &self.hyperparameters[i])
    }

    /// Hyperparameter names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.hyperparameters.iter().map(Hyperparameter::name).collect()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Names of the hyperparameters `name` is conditioned on.
    ///
    /// Empty for unconditional or unknown hyperparameters.
    #[must_use]
    pub fn parents_of(&self, name: &str) -> &[String] {
        self.index_of(name).map_or(&[], |i| &self.parents[i])
    }

    /// Whether the hyperparameter at `index` has any parent.
    pub(crate) fn is_conditional(&self, index: usize) -> bool {
        !self.parents[index].is_empty()
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hyperparameters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hyperparameters.is_empty()
    }

    /// Whether every condition on `name` holds for `config`.
    #[must_use]
    pub fn is_active(&self, name: &str, config: &Configuration) -> bool {
        self.index_of(name).is_some_and(|i| self.active_at(i, config))
    }

    fn active_at(&self, index: usize, config: &Configuration) -> bool {
        self.conditions_of[index]
            .iter()
            .all(|&ci| self.conditions[ci].holds(config))
    }

    /// Validate `config` and return it with canonical values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownHyperparameter`] for names outside the space
    /// and [`Error::InvalidConfiguration`] when a value is outside its
    /// domain, an active hyperparameter is missing, or an inactive one is set.
    pub fn normalize(&self, config: &Configuration) -> Result<Configuration> {
        if let Some((name, _)) = config.iter().find(|(name, _)| !self.index.contains_key(*name)) {
            return Err(Error::UnknownHyperparameter(name.to_string()));
        }

        let mut out = Configuration::new();
        for (i, hp) in self.hyperparameters.iter().enumerate() {
            let active = self.active_at(i, config);
            match (active, config.get(hp.name())) {
                (true, Some(value)) => {
                    out.insert(hp.name(), hp.canonicalize(value)?);
                }
                (true, None) => {
                    return Err(Error::InvalidConfiguration {
                        name: hp.name().to_string(),
                        reason: "active hyperparameter has no value".to_string(),
                    });
                }
                (false, Some(_)) => {
                    return Err(Error::InvalidConfiguration {
                        name: hp.name().to_string(),
                        reason: "inactive hyperparameter has a value".to_string(),
                    });
                }
                (false, None) => {}
            }
        }
        Ok(out)
    }

    /// Numeric vector in hyperparameter order; inactive entries are NaN.
    #[must_use]
    pub fn encode(&self, config: &Configuration) -> Vec<f64> {
        self.hyperparameters
            .iter()
            .map(|hp| config.get(hp.name()).map_or(f64::NAN, |v| hp.encode(v)))
            .collect()
    }

    /// Serialize to the `configspace.json` interchange format.
    ///
    /// # Errors
    ///
    /// Returns a [`Storage`](Error::Storage) error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Storage(e.to_string()))
    }

    /// Parse the `configspace.json` interchange format.
    ///
    /// # Errors
    ///
    /// Returns a [`Storage`](Error::Storage) error for malformed JSON and
    /// the usual validation errors for an inconsistent space.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SpaceFile =
            serde_json::from_str(json).map_err(|e| Error::Storage(e.to_string()))?;
        Self::try_from(file)
    }
}

impl PartialEq for ConfigSpace {
    fn eq(&self, other: &Self) -> bool {
        self.hyperparameters == other.hyperparameters
            && self.conditions == other.conditions
            && self.forbiddens == other.forbiddens
            && self.extra == other.extra
    }
}

impl TryFrom<SpaceFile> for ConfigSpace {
    type Error = Error;

    fn try_from(file: SpaceFile) -> Result<Self> {
        Self::assemble(file.hyperparameters, file.conditions, file.forbiddens, file.extra)
    }
}

impl From<ConfigSpace> for SpaceFile {
    fn from(space: ConfigSpace) -> Self {
        Self {
            hyperparameters: space.hyperparameters,
            conditions: space.conditions,
            forbiddens: space.forbiddens,
            extra: space.extra,
        }
    }
}

/// Fluent builder for [`ConfigSpace`].
#[derive(Debug, Default)]
pub struct ConfigSpaceBuilder {
    hyperparameters: Vec<Hyperparameter>,
    conditions: Vec<Condition>,
}

impl ConfigSpaceBuilder {
    /// Append a hyperparameter.
    #[must_use]
    pub fn add(mut self, hp: impl Into<Hyperparameter>) -> Self {
        self.hyperparameters.push(hp.into());
        self
    }

    /// Append a condition.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Build the space.
    ///
    /// # Errors
    ///
    /// See [`ConfigSpace::new`].
    pub fn build(self) -> Result<ConfigSpace> {
        ConfigSpace::new(self.hyperparameters, self.conditions)
    }
}
