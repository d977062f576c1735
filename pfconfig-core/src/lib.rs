//! Primitives for reading, editing and writing a pfSense `config.xml`.
//!
//! The crate knows nothing about individual packages. It provides a plain
//! [`XmlNode`] tree, a [`ConfigDocument`] handle that owns one loaded document
//! for a read-modify-write pass, and a field-level diff over flat
//! `name -> value` maps used for change reporting.

pub mod diff;
pub mod document;
pub mod format;
pub mod parser;
pub mod tree;
pub mod writer;

pub use diff::{diff_fields, FieldChange, FieldMap};
pub use document::{ConfigDocument, DocumentError};
pub use format::{format_summary, format_text};
pub use parser::{parse, parse_file, ParseError};
pub use tree::{Lookup, XmlNode};
pub use writer::{write, write_file, WriteError};
