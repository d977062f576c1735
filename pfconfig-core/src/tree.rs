use std::collections::BTreeMap;

use serde::Serialize;

/// A generic XML element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlNode {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
    /// Optional text content.
    pub text: Option<String>,
}

/// Result of looking up a child that is expected to occur at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// No child with the tag exists.
    Absent,
    /// Exactly one child exists, at this index in `children`.
    Unique(usize),
    /// The tag occurs this many times.
    Multiple(usize),
}

impl XmlNode {
    /// Create a new element with no attributes, children, or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create a leaf element holding `text`.
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.text = Some(text.into());
        node
    }

    /// Return the first child with the provided tag.
    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Return the first child with the provided tag, mutably.
    pub fn get_child_mut(&mut self, tag: &str) -> Option<&mut XmlNode> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    /// Return all children with the provided tag.
    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Walk a nested child path and return the terminal node if found.
    pub fn get_path(&self, path: &[&str]) -> Option<&XmlNode> {
        let mut current = self;
        for segment in path {
            current = current.get_child(segment)?;
        }
        Some(current)
    }

    /// Walk a nested child path and return the terminal node mutably.
    pub fn get_path_mut(&mut self, path: &[&str]) -> Option<&mut XmlNode> {
        let mut current = self;
        for segment in path {
            current = current.get_child_mut(segment)?;
        }
        Some(current)
    }

    /// Walk a nested child path and return terminal node text if found.
    pub fn get_text<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        self.get_path(path)?.text.as_deref()
    }

    /// Classify how many children carry `tag`.
    pub fn lookup_child(&self, tag: &str) -> Lookup {
        let mut found = None;
        let mut count = 0;
        for (idx, child) in self.children.iter().enumerate() {
            if child.tag == tag {
                found.get_or_insert(idx);
                count += 1;
            }
        }
        match (count, found) {
            (0, _) | (_, None) => Lookup::Absent,
            (1, Some(idx)) => Lookup::Unique(idx),
            (n, Some(_)) => Lookup::Multiple(n),
        }
    }

    /// Get a child by tag, appending an empty one when missing.
    pub fn ensure_child_mut(&mut self, tag: &str) -> &mut XmlNode {
        let idx = match self.children.iter().position(|c| c.tag == tag) {
            Some(idx) => idx,
            None => {
                self.children.push(XmlNode::new(tag));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    /// Set the text of the first `tag` child, inserting it when missing.
    ///
    /// Returns `true` when the stored text changed. `None` and `""` compare
    /// equal since both are written as an empty element.
    pub fn set_child_text(&mut self, tag: &str, value: &str) -> bool {
        if let Some(child) = self.get_child_mut(tag) {
            if child.text.as_deref().unwrap_or("") == value {
                return false;
            }
            child.text = Some(value.to_string());
            return true;
        }
        self.children.push(XmlNode::with_text(tag, value));
        true
    }

    /// Remove every child carrying `tag`. Returns `true` if any was removed.
    pub fn remove_children(&mut self, tag: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c.tag != tag);
        self.children.len() != before
    }

    /// Flatten direct leaf children into a `tag -> text` map.
    ///
    /// Children that themselves have children are skipped. Repeated tags keep
    /// the first occurrence.
    pub fn leaf_map(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for child in &self.children {
            if !child.children.is_empty() {
                continue;
            }
            out.entry(child.tag.clone())
                .or_insert_with(|| child.text.clone().unwrap_or_default());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{Lookup, XmlNode};

    fn sample() -> XmlNode {
        let mut root = XmlNode::new("pfsense");
        let mut packages = XmlNode::new("installedpackages");
        let mut pkg = XmlNode::new("zabbixagentlts");
        let mut config = XmlNode::new("config");
        config.children.push(XmlNode::with_text("hostname", "fw1"));
        config.children.push(XmlNode::new("tlspskfile"));
        pkg.children.push(config);
        packages.children.push(pkg);
        root.children.push(packages);
        root
    }

    #[test]
    fn get_text_walks_nested_path() {
        let root = sample();
        assert_eq!(
            root.get_text(&["installedpackages", "zabbixagentlts", "config", "hostname"]),
            Some("fw1")
        );
    }

    #[test]
    fn lookup_child_distinguishes_absent_unique_and_multiple() {
        let mut root = sample();
        let packages = root.get_child_mut("installedpackages").expect("packages");
        assert_eq!(packages.lookup_child("snort"), Lookup::Absent);
        assert_eq!(packages.lookup_child("zabbixagentlts"), Lookup::Unique(0));

        packages.children.push(XmlNode::new("zabbixagentlts"));
        assert_eq!(packages.lookup_child("zabbixagentlts"), Lookup::Multiple(2));
    }

    #[test]
    fn set_child_text_reports_only_real_changes() {
        let mut root = sample();
        let config = root
            .get_path_mut(&["installedpackages", "zabbixagentlts", "config"])
            .expect("config");

        assert!(!config.set_child_text("hostname", "fw1"));
        assert!(!config.set_child_text("tlspskfile", ""));
        assert!(config.set_child_text("hostname", "fw2"));
        assert!(config.set_child_text("timeout", "3"));
        assert_eq!(config.get_text(&["timeout"]), Some("3"));
    }

    #[test]
    fn remove_children_and_leaf_map() {
        let mut root = sample();
        let config = root
            .get_path_mut(&["installedpackages", "zabbixagentlts", "config"])
            .expect("config");

        assert!(config.remove_children("hostname"));
        assert!(!config.remove_children("hostname"));

        let map = config.leaf_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("tlspskfile").map(String::as_str), Some(""));
    }
}
