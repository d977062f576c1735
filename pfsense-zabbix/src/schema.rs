//! Declared parameter schema for the zabbix-agent package and its validator.

use thiserror::Error;
use tracing::warn;

use crate::params::{ParamSet, ParamValue, RawParams};

/// Modes accepted by `tlsconnect` and by each entry of `tlsaccept`.
pub const TLS_MODES: &[&str] = &["unencrypted", "psk", "cert"];

/// Expected shape of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Int,
    Bool,
    Choice(&'static [&'static str]),
    ChoiceList(&'static [&'static str]),
}

impl ParamKind {
    fn describe(self) -> &'static str {
        match self {
            ParamKind::Str => "string",
            ParamKind::Int => "integer",
            ParamKind::Bool => "boolean",
            ParamKind::Choice(_) => "string choice",
            ParamKind::ChoiceList(_) => "list of choices",
        }
    }
}

/// Value used when a parameter is not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDefault {
    /// The parameter is required.
    Required,
    Str(&'static str),
    Int(i64),
    Bool(bool),
    List(&'static [&'static str]),
}

impl ParamDefault {
    fn value(self) -> Option<ParamValue> {
        match self {
            ParamDefault::Required => None,
            ParamDefault::Str(s) => Some(ParamValue::Str(s.to_string())),
            ParamDefault::Int(i) => Some(ParamValue::Int(i)),
            ParamDefault::Bool(b) => Some(ParamValue::Bool(b)),
            ParamDefault::List(items) => Some(ParamValue::List(
                items.iter().map(|s| s.to_string()).collect(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: ParamDefault,
}

const fn spec(name: &'static str, kind: ParamKind, default: ParamDefault) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        default,
    }
}

/// Every parameter the zabbix-agent mapper accepts.
pub const ZABBIX_AGENT_PARAMS: &[ParamSpec] = &[
    spec("hostname", ParamKind::Str, ParamDefault::Required),
    spec("server", ParamKind::Str, ParamDefault::Required),
    spec("serveractive", ParamKind::Str, ParamDefault::Required),
    spec("listenip", ParamKind::Str, ParamDefault::Str("0.0.0.0")),
    spec("listenport", ParamKind::Int, ParamDefault::Int(10050)),
    spec("refreshactchecks", ParamKind::Int, ParamDefault::Int(120)),
    spec("timeout", ParamKind::Int, ParamDefault::Int(3)),
    spec("buffersend", ParamKind::Int, ParamDefault::Int(5)),
    spec("buffersize", ParamKind::Int, ParamDefault::Int(100)),
    spec("startagents", ParamKind::Int, ParamDefault::Int(3)),
    spec(
        "tlsconnect",
        ParamKind::Choice(TLS_MODES),
        ParamDefault::Str("unencrypted"),
    ),
    spec(
        "tlsaccept",
        ParamKind::ChoiceList(TLS_MODES),
        ParamDefault::List(&["unencrypted"]),
    ),
    spec("tlscafile", ParamKind::Str, ParamDefault::Str("none")),
    spec("tlscaos", ParamKind::Bool, ParamDefault::Bool(false)),
    spec("tlscrlfile", ParamKind::Str, ParamDefault::Str("none")),
    spec("tlscertfile", ParamKind::Str, ParamDefault::Str("none")),
    spec("tlspskidentity", ParamKind::Str, ParamDefault::Str("")),
    spec("tlspskfile", ParamKind::Str, ParamDefault::Str("")),
    spec("userparams", ParamKind::Str, ParamDefault::Str("")),
    spec("enabled", ParamKind::Bool, ParamDefault::Bool(false)),
];

/// An old parameter name still accepted in place of its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenamedParam {
    pub old: &'static str,
    pub new: &'static str,
}

pub const RENAMED_PARAMS: &[RenamedParam] = &[RenamedParam {
    old: "agentenabled",
    new: "enabled",
}];

/// Validation failures. All are raised before the document is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("unsupported parameter: {name}")]
    Unknown { name: String },
    #[error("missing required parameter: {name}")]
    Missing { name: String },
    #[error("parameters are mutually exclusive: {old} (renamed) and {new}")]
    Renamed { old: String, new: String },
    #[error("parameter {name} must be a {expected}, got {found}")]
    InvalidType {
        name: String,
        expected: &'static str,
        found: String,
    },
    #[error("value of {name} must be one of: {choices}, got: {value}")]
    InvalidChoice {
        name: String,
        value: String,
        choices: String,
    },
    #[error("parameter {name} must not be empty")]
    Empty { name: String },
}

/// Validate `raw` against [`ZABBIX_AGENT_PARAMS`].
pub fn validate(raw: RawParams) -> Result<ParamSet, ParamError> {
    validate_against(raw, ZABBIX_AGENT_PARAMS, RENAMED_PARAMS)
}

/// Validate `raw` against an arbitrary schema.
///
/// Renamed parameters are resolved first: supplying both names is an error,
/// supplying only the old name moves its value to the new one.
pub fn validate_against(
    mut raw: RawParams,
    specs: &[ParamSpec],
    renamed: &[RenamedParam],
) -> Result<ParamSet, ParamError> {
    for rename in renamed {
        if raw.contains_key(rename.old) && raw.contains_key(rename.new) {
            return Err(ParamError::Renamed {
                old: rename.old.to_string(),
                new: rename.new.to_string(),
            });
        }
        if let Some(value) = raw.remove(rename.old) {
            warn!(
                old = rename.old,
                new = rename.new,
                "parameter {} is deprecated, use {}",
                rename.old,
                rename.new
            );
            raw.insert(rename.new.to_string(), value);
        }
    }

    if let Some(name) = raw.keys().find(|k| !specs.iter().any(|s| s.name == k.as_str())) {
        return Err(ParamError::Unknown { name: name.clone() });
    }

    let mut params = ParamSet::new();
    for spec in specs {
        let value = match raw.remove(spec.name) {
            Some(value) => coerce(spec, &value)?,
            None => spec.default.value().ok_or_else(|| ParamError::Missing {
                name: spec.name.to_string(),
            })?,
        };
        params.insert(spec.name, value);
    }
    Ok(params)
}

fn coerce(spec: &ParamSpec, value: &toml::Value) -> Result<ParamValue, ParamError> {
    let invalid = || ParamError::InvalidType {
        name: spec.name.to_string(),
        expected: spec.kind.describe(),
        found: value.type_str().to_string(),
    };

    match spec.kind {
        ParamKind::Str => coerce_str(value).map(ParamValue::Str).ok_or_else(invalid),
        ParamKind::Int => match value {
            toml::Value::Integer(i) => Ok(ParamValue::Int(*i)),
            toml::Value::String(s) => s.trim().parse().map(ParamValue::Int).map_err(|_| invalid()),
            _ => Err(invalid()),
        },
        ParamKind::Bool => match value {
            toml::Value::Boolean(b) => Ok(ParamValue::Bool(*b)),
            toml::Value::Integer(0) => Ok(ParamValue::Bool(false)),
            toml::Value::Integer(1) => Ok(ParamValue::Bool(true)),
            toml::Value::String(s) => parse_bool(s).map(ParamValue::Bool).ok_or_else(invalid),
            _ => Err(invalid()),
        },
        ParamKind::Choice(choices) => {
            let s = coerce_str(value).ok_or_else(invalid)?;
            check_choice(spec.name, &s, choices)?;
            Ok(ParamValue::Str(s))
        }
        ParamKind::ChoiceList(choices) => {
            let items: Vec<String> = match value {
                toml::Value::Array(items) => items
                    .iter()
                    .map(|item| coerce_str(item).ok_or_else(invalid))
                    .collect::<Result<_, _>>()?,
                toml::Value::String(s) => s
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                _ => return Err(invalid()),
            };
            if items.is_empty() {
                return Err(ParamError::Empty {
                    name: spec.name.to_string(),
                });
            }
            for item in &items {
                check_choice(spec.name, item, choices)?;
            }
            Ok(ParamValue::List(items))
        }
    }
}

fn coerce_str(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn check_choice(name: &str, value: &str, choices: &[&str]) -> Result<(), ParamError> {
    if choices.contains(&value) {
        return Ok(());
    }
    Err(ParamError::InvalidChoice {
        name: name.to_string(),
        value: value.to_string(),
        choices: choices.join(", "),
    })
}
