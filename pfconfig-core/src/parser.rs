use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use thiserror::Error;

use crate::tree::XmlNode;

/// Errors that can occur while parsing XML into an [`XmlNode`] tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input XML could not be decoded or tokenized.
    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Tag, attribute or text bytes were not valid UTF-8.
    #[error("invalid UTF-8 while parsing XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// Failed to decode a text entity.
    #[error("failed to decode XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    /// Failed to read the input file.
    #[error("failed to read XML file: {0}")]
    Io(#[from] std::io::Error),
    /// Structural issue in the document.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// Parse XML bytes into an [`XmlNode`] tree.
///
/// Whitespace-only text is dropped from elements that have children, so
/// indentation in `config.xml` does not show up as node text. Leaf elements
/// keep their text as written. Comments, processing instructions and the XML
/// declaration are skipped.
pub fn parse(xml: &[u8]) -> Result<XmlNode, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(start_node(&e, &reader)?),
            Event::Empty(e) => {
                let node = start_node(&e, &reader)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    append_text(current, &e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    append_text(current, std::str::from_utf8(e.as_ref())?);
                }
            }
            Event::End(_) => {
                let mut node = stack.pop().ok_or_else(|| {
                    ParseError::Malformed("encountered closing tag without open tag".to_string())
                })?;
                drop_indentation(&mut node);
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::Malformed(
            "unclosed element(s) at end of document".to_string(),
        ));
    }

    root.ok_or_else(|| ParseError::Malformed("no root element found".to_string()))
}

/// Parse an XML file into an [`XmlNode`] tree.
pub fn parse_file(path: &Path) -> Result<XmlNode, ParseError> {
    let bytes = fs::read(path)?;
    parse(&bytes)
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::Malformed(
            "multiple top-level elements found".to_string(),
        ));
    }
    *root = Some(node);
    Ok(())
}

fn append_text(node: &mut XmlNode, text: &str) {
    match &mut node.text {
        Some(existing) => existing.push_str(text),
        None => node.text = Some(text.to_string()),
    }
}

fn drop_indentation(node: &mut XmlNode) {
    let blank = node.text.as_deref().is_some_and(|t| t.trim().is_empty());
    if blank && !node.children.is_empty() {
        node.text = None;
    }
}

fn start_node(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<XmlNode, ParseError> {
    let mut node = XmlNode::new(qname_to_string(e.name())?);

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = qname_to_string(attr.key)?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())?
            .into_owned();
        node.attributes.insert(key, value);
    }

    Ok(node)
}

fn qname_to_string(name: QName<'_>) -> Result<String, ParseError> {
    Ok(std::str::from_utf8(name.as_ref())?.to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse, ParseError};

    #[test]
    fn cdata_and_text_are_joined() {
        let node = parse(br#"<userparams><![CDATA[a&b]]></userparams>"#).expect("parse");
        assert_eq!(node.text.as_deref(), Some("a&b"));
    }

    #[test]
    fn indentation_is_dropped_but_blank_leaf_text_is_kept() {
        let xml = b"<config>\n\t<tlspskidentity> </tlspskidentity>\
                    \n\t<hostname>fw1</hostname>\n</config>";
        let node = parse(xml).expect("parse");
        assert_eq!(node.text, None);
        assert_eq!(node.get_text(&["tlspskidentity"]), Some(" "));
        assert_eq!(node.get_text(&["hostname"]), Some("fw1"));
    }

    #[test]
    fn rejects_two_roots() {
        let err = parse(br#"<a/><b/>"#).expect_err("two roots");
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn rejects_empty_document() {
        let err = parse(br#"<?xml version="1.0"?>"#).expect_err("no root");
        assert!(err.to_string().contains("no root element"));
    }
}
