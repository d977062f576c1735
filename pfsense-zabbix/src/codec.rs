//! Per-field codecs between parameter values and `<config>` child text.
//!
//! Each XML field has one entry in [`ZABBIX_AGENT_FIELDS`] carrying its
//! encode, decode and change-detection functions. Encoding to `None` means
//! the child element must not exist, which is how presence-marker booleans
//! store `false`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::params::ParamValue;

/// Text stored in a presence-marker field when the flag is set.
pub const FLAG_MARKER: &str = "on";

type EncodeFn = fn(&ParamValue) -> Option<String>;
type DecodeFn = fn(&'static str, Option<&str>) -> Result<Option<ParamValue>, CodecError>;
type ChangedFn = fn(Option<&str>, Option<&str>) -> bool;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("field {field} holds '{value}', expected an integer")]
    InvalidInteger { field: &'static str, value: String },
    #[error("field {field} is not valid base64")]
    InvalidBase64 { field: &'static str },
    #[error("field {field} does not decode to UTF-8 text")]
    InvalidUtf8 { field: &'static str },
}

/// Codec for one field of the persisted config.
#[derive(Clone, Copy)]
pub struct FieldCodec {
    /// Child tag under `<config>`.
    pub field: &'static str,
    /// Parameter feeding the field.
    pub param: &'static str,
    /// Change descriptions show the stored text instead of the parameter.
    pub opaque: bool,
    encode: EncodeFn,
    decode: DecodeFn,
    changed: ChangedFn,
}

impl std::fmt::Debug for FieldCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCodec")
            .field("field", &self.field)
            .field("param", &self.param)
            .finish()
    }
}

impl FieldCodec {
    /// Encode a parameter value to the text stored in the field, or `None`
    /// when the field must be absent.
    pub fn encode(&self, value: &ParamValue) -> Option<String> {
        (self.encode)(value)
    }

    /// Decode the stored text (`None` when the field is absent) back into a
    /// parameter value. `Ok(None)` means the field carries no value.
    pub fn decode(&self, stored: Option<&str>) -> Result<Option<ParamValue>, CodecError> {
        (self.decode)(self.field, stored)
    }

    /// Whether replacing `old` with `new` changes the stored value.
    pub fn changed(&self, old: Option<&str>, new: Option<&str>) -> bool {
        (self.changed)(old, new)
    }
}

const fn text(name: &'static str) -> FieldCodec {
    FieldCodec {
        field: name,
        param: name,
        opaque: false,
        encode: encode_text,
        decode: decode_text,
        changed: changed_exact,
    }
}

const fn integer(name: &'static str) -> FieldCodec {
    FieldCodec {
        field: name,
        param: name,
        opaque: false,
        encode: encode_text,
        decode: decode_integer,
        changed: changed_integer,
    }
}

const fn flag(field: &'static str, param: &'static str) -> FieldCodec {
    FieldCodec {
        field,
        param,
        opaque: false,
        encode: encode_flag,
        decode: decode_flag,
        changed: changed_presence,
    }
}

const fn list(name: &'static str) -> FieldCodec {
    FieldCodec {
        field: name,
        param: name,
        opaque: false,
        encode: encode_list,
        decode: decode_list,
        changed: changed_list,
    }
}

const fn base64_text(name: &'static str) -> FieldCodec {
    FieldCodec {
        field: name,
        param: name,
        opaque: true,
        encode: encode_base64,
        decode: decode_base64,
        changed: changed_base64,
    }
}

/// Field table in reporting order. The identity field comes first.
pub const ZABBIX_AGENT_FIELDS: &[FieldCodec] = &[
    text("hostname"),
    flag("agentenabled", "enabled"),
    text("server"),
    text("serveractive"),
    text("listenip"),
    integer("listenport"),
    integer("refreshactchecks"),
    integer("timeout"),
    integer("buffersend"),
    integer("buffersize"),
    integer("startagents"),
    text("tlsconnect"),
    list("tlsaccept"),
    text("tlscafile"),
    flag("tlscaos", "tlscaos"),
    text("tlscrlfile"),
    text("tlscertfile"),
    text("tlspskidentity"),
    text("tlspskfile"),
    base64_text("userparams"),
];

fn encode_text(value: &ParamValue) -> Option<String> {
    match value {
        ParamValue::Str(s) => Some(s.clone()),
        ParamValue::Int(i) => Some(i.to_string()),
        ParamValue::Bool(b) => Some(b.to_string()),
        ParamValue::List(items) => Some(items.join(",")),
    }
}

fn encode_flag(value: &ParamValue) -> Option<String> {
    matches!(value, ParamValue::Bool(true)).then(|| FLAG_MARKER.to_string())
}

fn encode_list(value: &ParamValue) -> Option<String> {
    match value {
        ParamValue::List(items) => Some(items.join(",")),
        other => encode_text(other),
    }
}

fn encode_base64(value: &ParamValue) -> Option<String> {
    let plain = encode_text(value)?;
    Some(STANDARD.encode(plain.as_bytes()))
}

fn decode_text(
    _field: &'static str,
    stored: Option<&str>,
) -> Result<Option<ParamValue>, CodecError> {
    Ok(stored.map(|s| ParamValue::Str(s.to_string())))
}

fn decode_integer(
    field: &'static str,
    stored: Option<&str>,
) -> Result<Option<ParamValue>, CodecError> {
    let Some(raw) = stored else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(|i| Some(ParamValue::Int(i)))
        .map_err(|_| CodecError::InvalidInteger {
            field,
            value: raw.to_string(),
        })
}

// Any present marker counts as set; pfSense itself only tests for presence.
fn decode_flag(
    _field: &'static str,
    stored: Option<&str>,
) -> Result<Option<ParamValue>, CodecError> {
    Ok(Some(ParamValue::Bool(stored.is_some())))
}

fn decode_list(
    _field: &'static str,
    stored: Option<&str>,
) -> Result<Option<ParamValue>, CodecError> {
    Ok(stored.map(|s| ParamValue::List(split_list(s))))
}

fn decode_base64(
    field: &'static str,
    stored: Option<&str>,
) -> Result<Option<ParamValue>, CodecError> {
    let Some(raw) = stored else {
        return Ok(None);
    };
    let bytes = STANDARD
        .decode(strip_whitespace(raw))
        .map_err(|_| CodecError::InvalidBase64 { field })?;
    let text = String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { field })?;
    Ok(Some(ParamValue::Str(text)))
}

fn changed_exact(old: Option<&str>, new: Option<&str>) -> bool {
    old != new
}

// An existing marker with other text, such as `<agentenabled/>`, is kept.
fn changed_presence(old: Option<&str>, new: Option<&str>) -> bool {
    old.is_some() != new.is_some()
}

fn changed_integer(old: Option<&str>, new: Option<&str>) -> bool {
    match (old, new) {
        (Some(a), Some(b)) => match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
            (Ok(x), Ok(y)) => x != y,
            _ => a != b,
        },
        _ => old != new,
    }
}

fn changed_list(old: Option<&str>, new: Option<&str>) -> bool {
    match (old, new) {
        (Some(a), Some(b)) => split_list(a) != split_list(b),
        _ => old != new,
    }
}

// Compare decoded payloads so re-wrapped base64 from the web GUI is not a change.
fn changed_base64(old: Option<&str>, new: Option<&str>) -> bool {
    match (old, new) {
        (Some(a), Some(b)) => {
            match (
                STANDARD.decode(strip_whitespace(a)),
                STANDARD.decode(strip_whitespace(b)),
            ) {
                (Ok(x), Ok(y)) => x != y,
                _ => a != b,
            }
        }
        _ => old != new,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::{CodecError, ZABBIX_AGENT_FIELDS};
    use crate::params::ParamValue;
    use crate::schema::ZABBIX_AGENT_PARAMS;

    fn codec(field: &str) -> super::FieldCodec {
        *ZABBIX_AGENT_FIELDS
            .iter()
            .find(|c| c.field == field)
            .expect("codec exists")
    }

    #[test]
    fn every_schema_parameter_has_exactly_one_codec() {
        for spec in ZABBIX_AGENT_PARAMS {
            let count = ZABBIX_AGENT_FIELDS
                .iter()
                .filter(|c| c.param == spec.name)
                .count();
            assert_eq!(count, 1, "parameter {}", spec.name);
        }
        assert_eq!(ZABBIX_AGENT_FIELDS.len(), ZABBIX_AGENT_PARAMS.len());
        assert_eq!(ZABBIX_AGENT_FIELDS[0].field, "hostname");
    }

    #[test]
    fn flag_encodes_presence_marker() {
        let enabled = codec("agentenabled");
        assert_eq!(enabled.param, "enabled");
        assert_eq!(enabled.encode(&ParamValue::Bool(true)).as_deref(), Some("on"));
        assert_eq!(enabled.encode(&ParamValue::Bool(false)), None);
        assert_eq!(enabled.decode(None), Ok(Some(ParamValue::Bool(false))));
        assert_eq!(enabled.decode(Some("yes")), Ok(Some(ParamValue::Bool(true))));
        assert!(enabled.changed(Some("on"), None));
        assert!(enabled.changed(None, Some("on")));
        assert!(!enabled.changed(None, None));
        assert!(!enabled.changed(Some(""), Some("on")));
        assert!(!enabled.opaque);
    }

    #[test]
    fn list_keeps_order_and_ignores_spacing() {
        let accept = codec("tlsaccept");
        let modes = ParamValue::List(vec!["cert".into(), "psk".into()]);
        assert_eq!(accept.encode(&modes).as_deref(), Some("cert,psk"));
        assert_eq!(accept.decode(Some("cert,psk")), Ok(Some(modes)));
        assert!(!accept.changed(Some("cert, psk"), Some("cert,psk")));
        assert!(accept.changed(Some("psk,cert"), Some("cert,psk")));
    }

    #[test]
    fn integer_change_ignores_formatting() {
        let timeout = codec("timeout");
        assert_eq!(timeout.encode(&ParamValue::Int(3)).as_deref(), Some("3"));
        assert!(!timeout.changed(Some(" 3"), Some("3")));
        assert!(timeout.changed(Some("3"), Some("4")));
        assert!(timeout.changed(None, Some("3")));
        assert_eq!(
            timeout.decode(Some("three")),
            Err(CodecError::InvalidInteger {
                field: "timeout",
                value: "three".into()
            })
        );
    }

    #[test]
    fn userparams_are_base64_encoded() {
        let userparams = codec("userparams");
        let plain = ParamValue::Str("UserParameter=pf.states,pfctl -si".into());
        let stored = userparams.encode(&plain).expect("encoded");
        assert_eq!(stored, "VXNlclBhcmFtZXRlcj1wZi5zdGF0ZXMscGZjdGwgLXNp");
        assert_eq!(userparams.decode(Some(stored.as_str())), Ok(Some(plain)));

        let empty = userparams.encode(&ParamValue::Str(String::new()));
        assert_eq!(empty.as_deref(), Some(""));
        assert_eq!(
            userparams.decode(Some("")),
            Ok(Some(ParamValue::Str(String::new())))
        );
        let wrapped = "VXNlclBh\ncmFtZXRlcj1wZi5zdGF0ZXMscGZjdGwgLXNp";
        assert!(!userparams.changed(Some(wrapped), Some(stored.as_str())));
        assert!(userparams.opaque);
        assert_eq!(
            userparams.decode(Some("%%%")),
            Err(CodecError::InvalidBase64 { field: "userparams" })
        );
    }
}
