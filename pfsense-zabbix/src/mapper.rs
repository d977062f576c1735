use pfconfig_core::{diff_fields, ConfigDocument, FieldChange, FieldMap, Lookup, XmlNode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::codec::{CodecError, FieldCodec, ZABBIX_AGENT_FIELDS};
use crate::params::{ParamSet, RawParams};
use crate::schema::{self, ParamError};

/// Path from the document root to the scope holding the package entry.
pub const PARENT_SCOPE: &[&str] = &["installedpackages"];
/// Tag of the managed entry inside [`PARENT_SCOPE`].
pub const TARGET_TAG: &str = "zabbixagentlts";
/// Child of the managed entry holding the fields.
pub const CONFIG_TAG: &str = "config";

const OBJECT_KIND: &str = "zabbix_agent";
const OBJECT_NAME: &str = "'zabbixagent'";

#[derive(Debug, Error)]
pub enum MapperError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(
        "unable to find {scope} configuration entry, is the zabbix-agent package installed?"
    )]
    MissingScope { scope: String },
    #[error("found {count} {path} entries, expected at most one")]
    Multiple { path: String, count: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// What a run did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Unchanged,
    Created,
    Updated,
}

/// Before/after snapshots of the `<config>` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub before: Option<FieldMap>,
    pub after: FieldMap,
}

/// Result of one mapper run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub operation: Operation,
    pub diff: Diff,
    pub changes: Vec<FieldChange>,
    pub commands: Vec<String>,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        self.operation != Operation::Unchanged
    }
}

/// Canonical field values derived from a [`ParamSet`], one per codec.
#[derive(Debug, Clone)]
pub struct ConfigObject {
    entries: Vec<(FieldCodec, Option<String>)>,
}

impl ConfigObject {
    /// Encode `params` through `fields`. Parameters missing from the set
    /// encode as absent fields.
    pub fn build(params: &ParamSet, fields: &[FieldCodec]) -> Self {
        let entries = fields
            .iter()
            .map(|codec| {
                let value = params.get(codec.param).and_then(|v| codec.encode(v));
                (*codec, value)
            })
            .collect();
        Self { entries }
    }

    /// Flatten into a `field -> text` map, skipping absent fields.
    pub fn to_map(&self) -> FieldMap {
        self.entries
            .iter()
            .filter_map(|(codec, value)| Some((codec.field.to_string(), value.clone()?)))
            .collect()
    }
}

/// Maps zabbix-agent parameters onto `installedpackages/zabbixagentlts`.
#[derive(Debug, Clone, Copy)]
pub struct ZabbixAgentMapper {
    fields: &'static [FieldCodec],
}

impl Default for ZabbixAgentMapper {
    fn default() -> Self {
        Self {
            fields: ZABBIX_AGENT_FIELDS,
        }
    }
}

impl ZabbixAgentMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `raw` and apply it to `doc`.
    pub fn run(&self, doc: &mut ConfigDocument, raw: RawParams) -> Result<Outcome, MapperError> {
        let params = schema::validate(raw)?;
        self.apply(doc, &params)
    }

    /// Apply an already validated parameter set to `doc`.
    ///
    /// Every lookup happens before the first mutation, so an error leaves the
    /// document untouched.
    pub fn apply(
        &self,
        doc: &mut ConfigDocument,
        params: &ParamSet,
    ) -> Result<Outcome, MapperError> {
        let object = ConfigObject::build(params, self.fields);
        let scope = doc.scope_mut(PARENT_SCOPE).ok_or_else(missing_scope)?;

        match locate(scope, TARGET_TAG, TARGET_TAG)? {
            None => Ok(self.create(scope, &object, params)),
            Some(idx) => self.update(&mut scope.children[idx], &object, params),
        }
    }

    /// Decode the stored entry back into parameters, `None` when absent.
    pub fn read(&self, doc: &ConfigDocument) -> Result<Option<ParamSet>, MapperError> {
        let scope = doc.scope(PARENT_SCOPE).ok_or_else(missing_scope)?;
        let Some(idx) = locate(scope, TARGET_TAG, TARGET_TAG)? else {
            return Ok(None);
        };
        let target = &scope.children[idx];
        let config = locate(target, CONFIG_TAG, &config_path())?.map(|i| &target.children[i]);

        let mut params = ParamSet::new();
        for codec in self.fields {
            let stored = config.and_then(|c| stored_text(c, codec.field));
            if let Some(value) = codec.decode(stored)? {
                params.insert(codec.param, value);
            }
        }
        Ok(Some(params))
    }

    fn create(&self, scope: &mut XmlNode, object: &ConfigObject, params: &ParamSet) -> Outcome {
        let mut config = XmlNode::new(CONFIG_TAG);
        for (codec, value) in &object.entries {
            if let Some(value) = value {
                config.children.push(XmlNode::with_text(codec.field, value.as_str()));
            }
        }
        let after = object.to_map();

        let mut target = XmlNode::new(TARGET_TAG);
        target.children.push(config);
        scope.children.push(target);
        info!(tag = TARGET_TAG, "created zabbix-agent configuration");

        Outcome {
            operation: Operation::Created,
            changes: diff_fields(&FieldMap::new(), &after, &self.field_order()),
            diff: Diff {
                before: None,
                after,
            },
            commands: vec![self.create_command(object, params)],
        }
    }

    fn update(
        &self,
        target: &mut XmlNode,
        object: &ConfigObject,
        params: &ParamSet,
    ) -> Result<Outcome, MapperError> {
        let config_missing = locate(target, CONFIG_TAG, &config_path())?.is_none();
        let config = target.ensure_child_mut(CONFIG_TAG);
        let before = config.leaf_map();

        let mut updated: Vec<(&FieldCodec, Option<&str>)> = Vec::new();
        for (codec, new) in &object.entries {
            let old = stored_text(config, codec.field);
            if !codec.changed(old, new.as_deref()) {
                continue;
            }
            debug!(field = codec.field, ?old, ?new, "field changed");
            match new {
                Some(value) => {
                    config.set_child_text(codec.field, value);
                }
                None => {
                    config.remove_children(codec.field);
                }
            }
            updated.push((codec, new.as_deref()));
        }

        let after = config.leaf_map();
        let operation = if updated.is_empty() && !config_missing {
            Operation::Unchanged
        } else {
            info!(fields = updated.len(), "updated zabbix-agent configuration");
            Operation::Updated
        };
        let commands = match operation {
            Operation::Unchanged => Vec::new(),
            _ => vec![self.update_command(&updated, params)],
        };

        Ok(Outcome {
            operation,
            changes: diff_fields(&before, &after, &self.field_order()),
            diff: Diff {
                before: Some(before),
                after,
            },
            commands,
        })
    }

    fn field_order(&self) -> Vec<&'static str> {
        self.fields.iter().map(|c| c.field).collect()
    }

    fn create_command(&self, object: &ConfigObject, params: &ParamSet) -> String {
        let mut cmd = format!("create {OBJECT_KIND} {OBJECT_NAME}");
        for (codec, value) in &object.entries {
            if value.as_deref().is_some_and(|v| !v.is_empty()) {
                cmd.push_str(", ");
                cmd.push_str(&cli_field(codec, value.as_deref(), params));
            }
        }
        cmd
    }

    fn update_command(&self, updated: &[(&FieldCodec, Option<&str>)], params: &ParamSet) -> String {
        let mut cmd = format!("update {OBJECT_KIND} {OBJECT_NAME} set");
        for (idx, (codec, stored)) in updated.iter().enumerate() {
            if idx > 0 {
                cmd.push(',');
            }
            cmd.push(' ');
            cmd.push_str(&cli_field(codec, *stored, params));
        }
        cmd
    }
}

/// `param=value` for a change description. Opaque fields show their stored
/// text so decoded payloads never reach the revision log.
fn cli_field(codec: &FieldCodec, stored: Option<&str>, params: &ParamSet) -> String {
    if codec.opaque {
        return match stored {
            Some(text) => format!("{}='{text}'", codec.param),
            None => format!("{}=none", codec.param),
        };
    }
    match params.get(codec.param) {
        Some(value) => format!("{}={value}", codec.param),
        None => format!("{}=none", codec.param),
    }
}

/// Find the only `tag` child of `parent`.
fn locate(parent: &XmlNode, tag: &str, path: &str) -> Result<Option<usize>, MapperError> {
    match parent.lookup_child(tag) {
        Lookup::Absent => {
            debug!(tag, "no existing entry");
            Ok(None)
        }
        Lookup::Unique(idx) => Ok(Some(idx)),
        Lookup::Multiple(count) => Err(MapperError::Multiple {
            path: path.to_string(),
            count,
        }),
    }
}

/// Text of a present field, with an empty element reading as `""`.
fn stored_text<'a>(config: &'a XmlNode, field: &str) -> Option<&'a str> {
    config
        .get_child(field)
        .map(|child| child.text.as_deref().unwrap_or(""))
}

fn config_path() -> String {
    format!("{TARGET_TAG}/{CONFIG_TAG}")
}

fn missing_scope() -> MapperError {
    MapperError::MissingScope {
        scope: PARENT_SCOPE.join("/"),
    }
}
