use crate::errors::ParameterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single strategy parameter. Untagged so TOML/JSON literals map directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(v) => write!(f, "{v}"),
            ParameterValue::Int(v) => write!(f, "{v}"),
            ParameterValue::Float(v) => write!(f, "{v}"),
            ParameterValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Int(value)
    }
}

impl From<usize> for ParameterValue {
    fn from(value: usize) -> Self {
        ParameterValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Float(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Text(value)
    }
}

/// Ordered parameter bag. Reads are typed; a wrong type is an error, never a silent default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<ParameterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParameterValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.values.iter()
    }

    /// Returns a copy of `self` with every key of `overrides` replaced.
    pub fn merged(&self, overrides: &ParameterSet) -> ParameterSet {
        let mut out = self.clone();
        for (key, value) in &overrides.values {
            out.values.insert(key.clone(), value.clone());
        }
        out
    }

    fn require(&self, key: &str) -> Result<&ParameterValue, ParameterError> {
        self.values
            .get(key)
            .ok_or_else(|| ParameterError::Missing(key.to_string()))
    }

    pub fn get_usize(&self, key: &str) -> Result<usize, ParameterError> {
        match self.require(key)? {
            ParameterValue::Int(v) => usize::try_from(*v)
                .map_err(|_| ParameterError::invalid(key, format!("{v} is negative"))),
            _ => Err(ParameterError::TypeMismatch {
                key: key.to_string(),
                expected: "a non-negative integer",
            }),
        }
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, ParameterError> {
        match self.require(key)? {
            ParameterValue::Float(v) if v.is_finite() => Ok(*v),
            ParameterValue::Float(v) => Err(ParameterError::invalid(key, format!("{v} is not finite"))),
            ParameterValue::Int(v) => Ok(*v as f64),
            _ => Err(ParameterError::TypeMismatch {
                key: key.to_string(),
                expected: "a number",
            }),
        }
    }

    pub fn get_text(&self, key: &str) -> Result<&str, ParameterError> {
        match self.require(key)? {
            ParameterValue::Text(v) => Ok(v.as_str()),
            _ => Err(ParameterError::TypeMismatch {
                key: key.to_string(),
                expected: "a string",
            }),
        }
    }
}

impl FromIterator<(String, ParameterValue)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, ParameterValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Check helpers shared by the typed parameter structs.
pub(crate) fn require_period(key: &str, value: usize) -> Result<usize, ParameterError> {
    if value == 0 {
        return Err(ParameterError::invalid(key, "period must be >= 1"));
    }
    Ok(value)
}

pub(crate) fn require_unit_interval(key: &str, value: f64) -> Result<f64, ParameterError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ParameterError::invalid(key, format!("{value} is outside [0, 1]")));
    }
    Ok(value)
}

pub(crate) fn require_positive(key: &str, value: f64) -> Result<f64, ParameterError> {
    if value <= 0.0 {
        return Err(ParameterError::invalid(key, format!("{value} must be > 0")));
    }
    Ok(value)
}

pub(crate) fn require_less(
    lower_key: &str,
    lower: f64,
    upper_key: &str,
    upper: f64,
) -> Result<(), ParameterError> {
    if lower >= upper {
        return Err(ParameterError::invalid(
            lower_key,
            format!("must be less than `{upper_key}` ({lower} >= {upper})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ParameterSet, ParameterValue};
    use crate::errors::ParameterError;

    #[test]
    fn typed_getters_coerce_ints_to_floats_only() {
        let params = ParameterSet::new()
            .with("period", 14usize)
            .with("threshold", 70i64)
            .with("mode", "momentum");

        assert_eq!(params.get_usize("period").unwrap(), 14);
        assert_eq!(params.get_f64("threshold").unwrap(), 70.0);
        assert_eq!(params.get_text("mode").unwrap(), "momentum");
        assert!(matches!(
            params.get_usize("mode"),
            Err(ParameterError::TypeMismatch { .. })
        ));
        assert_eq!(
            params.get_text("missing"),
            Err(ParameterError::Missing("missing".to_string()))
        );
    }

    #[test]
    fn negative_int_is_not_a_period() {
        let params = ParameterSet::new().with("period", -3i64);
        assert!(matches!(
            params.get_usize("period"),
            Err(ParameterError::Invalid { .. })
        ));
    }

    #[test]
    fn merged_overrides_key_by_key() {
        let defaults = ParameterSet::new().with("a", 1i64).with("b", 2i64);
        let overrides = ParameterSet::new().with("b", 5i64);
        let merged = defaults.merged(&overrides);
        assert_eq!(merged.get("a"), Some(&ParameterValue::Int(1)));
        assert_eq!(merged.get("b"), Some(&ParameterValue::Int(5)));
    }

    #[test]
    fn deserializes_untagged_literals() {
        let params: ParameterSet =
            serde_json::from_str(r#"{"fast": 12, "k": 2.5, "on": true, "mode": "swing"}"#)
                .unwrap();
        assert_eq!(params.get("fast"), Some(&ParameterValue::Int(12)));
        assert_eq!(params.get("k"), Some(&ParameterValue::Float(2.5)));
        assert_eq!(params.get("on"), Some(&ParameterValue::Bool(true)));
        assert_eq!(params.get_text("mode").unwrap(), "swing");
    }
}
