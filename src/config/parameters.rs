use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// A resolved parameter mapping, as read from one or more YAML files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(Mapping);

impl Parameters {
    pub fn new(mapping: Mapping) -> Parameters {
        Parameters(mapping)
    }

    /// Parses an inline YAML document. An empty document is an empty mapping.
    pub fn from_yaml_str(yaml: &str) -> Result<Parameters> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|source| Error::Yaml {
            path: Path::new("<inline>").to_owned(),
            source,
        })?;
        Parameters::from_value(value, "<inline>")
    }

    pub(crate) fn from_value(value: Value, origin: &str) -> Result<Parameters> {
        match value {
            Value::Null => Ok(Parameters::default()),
            Value::Mapping(mapping) => Ok(Parameters(mapping)),
            _ => Err(Error::InvalidValue {
                key: origin.to_string(),
                expected: "a mapping at the top level".to_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    /// Top-level keys, rendered as strings
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().map(key_name).collect()
    }

    /// Follows `path` through nested mappings.
    ///
    /// Fails with [`Error::MissingKey`] carrying the dotted path up to the
    /// first absent key. No default is ever substituted.
    pub fn lookup(&self, path: &[&str]) -> Result<&Value> {
        let mut mapping = &self.0;
        let mut found: Option<&Value> = None;
        for (depth, key) in path.iter().enumerate() {
            if let Some(value) = found {
                mapping = match value {
                    Value::Mapping(inner) => inner,
                    _ => {
                        return Err(Error::InvalidValue {
                            key: path[..depth].join("."),
                            expected: "a mapping".to_string(),
                        })
                    }
                };
            }
            match mapping.get(*key) {
                Some(value) => found = Some(value),
                None => return Err(Error::MissingKey(path[..=depth].join("."))),
            }
        }
        found.ok_or_else(|| Error::MissingKey(String::new()))
    }

    pub fn lookup_f64(&self, path: &[&str]) -> Result<f64> {
        self.lookup(path)?.as_f64().ok_or_else(|| invalid(path, "a number"))
    }

    pub fn lookup_u32(&self, path: &[&str]) -> Result<u32> {
        self.lookup(path)?
            .as_u64()
            .filter(|value| *value > 0 && *value <= u64::from(u32::MAX))
            .map(|value| value as u32)
            .ok_or_else(|| invalid(path, "a positive integer"))
    }

    /// A number or a sequence of numbers
    pub fn lookup_f64_seq(&self, path: &[&str]) -> Result<Vec<f64>> {
        match self.lookup(path)? {
            Value::Sequence(values) => values
                .iter()
                .map(|value| value.as_f64().ok_or_else(|| invalid(path, "a list of numbers")))
                .collect(),
            value => value
                .as_f64()
                .map(|single| vec![single])
                .ok_or_else(|| invalid(path, "a number or a list of numbers")),
        }
    }

    /// Shallow merge: each top-level key of `other` replaces the one here
    pub fn merge(&mut self, other: Parameters) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }
}

impl From<Mapping> for Parameters {
    fn from(mapping: Mapping) -> Self {
        Parameters(mapping)
    }
}

pub(crate) fn key_name(key: &Value) -> String {
    match key {
        Value::String(name) => name.clone(),
        other => serde_yaml::to_string(other)
            .map(|rendered| rendered.trim().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}

fn invalid(path: &[&str], expected: &str) -> Error {
    Error::InvalidValue {
        key: path.join("."),
        expected: expected.to_string(),
    }
}
