use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, info};

use crate::parser::{parse, parse_file, ParseError};
use crate::tree::XmlNode;
use crate::writer::{write_file, WriteError};

/// Errors raised while loading or saving a [`ConfigDocument`].
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to load config {path}: {source}")]
    Load { path: String, source: ParseError },
    #[error("failed to save config {path}: {source}")]
    Save { path: String, source: WriteError },
    #[error("config document has no backing file")]
    NoPath,
}

/// One loaded configuration document.
///
/// The handle is the only way the mapper reaches the document: callers load
/// it, pass `&mut ConfigDocument` into the operation, then decide whether to
/// [`save`](Self::save) it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    path: Option<PathBuf>,
    root: XmlNode,
}

impl ConfigDocument {
    /// Load and parse the document at `path`.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let root = parse_file(path).map_err(|source| DocumentError::Load {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), root = %root.tag, "loaded config document");
        Ok(Self {
            path: Some(path.to_path_buf()),
            root,
        })
    }

    /// Parse an in-memory document with no backing file.
    pub fn from_bytes(xml: &[u8]) -> Result<Self, ParseError> {
        Ok(Self::from_root(parse(xml)?))
    }

    /// Wrap an already-built tree.
    pub fn from_root(root: XmlNode) -> Self {
        Self { path: None, root }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    /// Return the element at `path` below the root, if it exists.
    pub fn scope(&self, path: &[&str]) -> Option<&XmlNode> {
        self.root.get_path(path)
    }

    /// Return the element at `path` below the root mutably, if it exists.
    pub fn scope_mut(&mut self, path: &[&str]) -> Option<&mut XmlNode> {
        self.root.get_path_mut(path)
    }

    /// Record who changed the document and why in `<revision>`.
    pub fn stamp_revision(&mut self, description: &str, username: &str, time: u64) {
        let revision = self.root.ensure_child_mut("revision");
        revision.set_child_text("time", &time.to_string());
        revision.set_child_text("description", description);
        revision.set_child_text("username", username);
    }

    /// Stamp the revision with the current time and write the document back
    /// to the file it was loaded from.
    pub fn save(&mut self, description: &str, username: &str) -> Result<(), DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::NoPath)?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.stamp_revision(description, username, now);
        write_file(&self.root, &path).map_err(|source| DocumentError::Save {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), %description, "wrote config document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigDocument, DocumentError};

    #[test]
    fn scope_walks_from_root() {
        let doc = ConfigDocument::from_bytes(
            br#"<pfsense><installedpackages>
                <package><name>zabbix-agent</name></package>
            </installedpackages></pfsense>"#,
        )
        .expect("parse");
        assert!(doc.scope(&["installedpackages"]).is_some());
        assert!(doc.scope(&["installedpackages", "zabbixagentlts"]).is_none());
    }

    #[test]
    fn stamp_revision_overwrites_previous_values() {
        let mut doc = ConfigDocument::from_bytes(
            br#"<pfsense><revision>
                <time>1</time><description>old</description><username>admin</username>
            </revision></pfsense>"#,
        )
        .expect("parse");

        doc.stamp_revision("zabbix agent updated", "pfsense-zabbix", 1700000000);

        assert_eq!(doc.root().get_text(&["revision", "time"]), Some("1700000000"));
        assert_eq!(
            doc.root().get_text(&["revision", "description"]),
            Some("zabbix agent updated")
        );
        assert_eq!(doc.root().get_children("revision").len(), 1);
    }

    #[test]
    fn save_without_path_is_an_error() {
        let mut doc = ConfigDocument::from_bytes(br#"<pfsense/>"#).expect("parse");
        let err = doc.save("x", "y").expect_err("no path");
        assert!(matches!(err, DocumentError::NoPath));
    }
}
