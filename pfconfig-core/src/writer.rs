use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::tree::XmlNode;

/// Errors that can occur while writing XML from an [`XmlNode`] tree.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to serialize XML bytes.
    #[error("failed to write XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Failed to write the output file.
    #[error("failed to write XML file: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize an [`XmlNode`] tree into tab-indented XML with a declaration,
/// the layout pfSense itself writes.
pub fn write(node: &XmlNode) -> Result<Vec<u8>, WriteError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    write_node(&mut writer, node)?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Serialize an [`XmlNode`] tree and write it to `path`.
///
/// The bytes go to a sibling temporary file first and are renamed over
/// `path`, so readers never observe a half-written config.
pub fn write_file(node: &XmlNode, path: &Path) -> Result<(), WriteError> {
    let bytes = write(node)?;
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = node.text.as_deref().filter(|t| !t.is_empty());
    if node.children.is_empty() && text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.tag.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write;
    use crate::tree::XmlNode;

    #[test]
    fn empty_text_is_written_as_empty_element() {
        let mut root = XmlNode::new("config");
        root.children.push(XmlNode::with_text("tlspskfile", ""));
        root.children.push(XmlNode::with_text("hostname", "fw1"));

        let out = String::from_utf8(write(&root).expect("write")).expect("utf8");
        assert!(out.starts_with("<?xml version=\"1.0\"?>"));
        assert!(out.contains("<tlspskfile/>"));
        assert!(out.contains("<hostname>fw1</hostname>"));
    }
}
