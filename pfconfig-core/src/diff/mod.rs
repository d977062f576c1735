//! Field-level diffing of flat `name -> value` maps.

pub mod engine;
pub mod result;

pub use engine::{diff_fields, FieldMap};
pub use result::FieldChange;
