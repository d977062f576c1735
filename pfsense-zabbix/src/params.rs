use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Unvalidated parameters keyed by name, as read from a TOML file or `--set`.
pub type RawParams = BTreeMap<String, toml::Value>;

/// A parameter value after schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl Display for ParamValue {
    /// Pseudo-CLI rendering used in change descriptions.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write!(f, "'{s}'"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
            ParamValue::List(items) => write!(f, "'{}'", items.join(",")),
        }
    }
}

/// A validated parameter set with every schema field resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParamSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name)? {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Errors returned when loading parameter files or `--set` overrides.
#[derive(Debug, Error)]
pub enum ParamFileError {
    #[error("failed to read parameter file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse parameter file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid override '{0}': expected name=value")]
    BadOverride(String),
}

/// Load raw parameters from a TOML file whose top-level keys are parameter
/// names.
pub fn load_params(path: &Path) -> Result<RawParams, ParamFileError> {
    let raw = fs::read_to_string(path).map_err(|source| ParamFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_params(&raw, path.display().to_string())
}

/// Parse raw parameters from TOML text.
pub fn parse_params(raw: &str, origin: String) -> Result<RawParams, ParamFileError> {
    let table: toml::Table = toml::from_str(raw).map_err(|source| ParamFileError::Parse {
        path: origin,
        source,
    })?;
    Ok(table.into_iter().collect())
}

/// Parse a `name=value` override. The value is kept as a string and coerced
/// later against the schema.
pub fn parse_override(raw: &str) -> Result<(String, toml::Value), ParamFileError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| ParamFileError::BadOverride(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ParamFileError::BadOverride(raw.to_string()));
    }
    Ok((name.to_string(), toml::Value::String(value.to_string())))
}

#[cfg(test)]
mod tests {
    use super::{parse_override, parse_params, ParamFileError, ParamValue};

    #[test]
    fn parses_typed_toml_values() {
        let raw = parse_params(
            "hostname = \"fw1\"\nlistenport = 10051\nenabled = true\n\
             tlsaccept = [\"psk\", \"cert\"]\n",
            "inline".to_string(),
        )
        .expect("parse");

        assert_eq!(raw.len(), 4);
        assert_eq!(raw.get("listenport").and_then(toml::Value::as_integer), Some(10051));
        assert!(raw.get("tlsaccept").is_some_and(toml::Value::is_array));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = parse_params("hostname = ", "inline".to_string()).expect_err("bad toml");
        assert!(matches!(err, ParamFileError::Parse { .. }));
    }

    #[test]
    fn override_keeps_everything_after_first_equals() {
        let (name, value) = parse_override("userparams=UserParameter=a,b").expect("parse");
        assert_eq!(name, "userparams");
        assert_eq!(value.as_str(), Some("UserParameter=a,b"));
        assert!(parse_override("=x").is_err());
        assert!(parse_override("hostname").is_err());
    }

    #[test]
    fn display_matches_cli_style() {
        assert_eq!(ParamValue::Str("fw1".into()).to_string(), "'fw1'");
        assert_eq!(ParamValue::Int(3).to_string(), "3");
        assert_eq!(ParamValue::Bool(false).to_string(), "False");
        assert_eq!(
            ParamValue::List(vec!["psk".into(), "cert".into()]).to_string(),
            "'psk,cert'"
        );
    }
}
