use serde::Serialize;

/// A single difference between two field maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum FieldChange {
    /// Field only present after the change.
    Added { field: String, value: String },
    /// Field only present before the change.
    Removed { field: String, value: String },
    /// Field present on both sides with different values.
    Modified {
        field: String,
        before: String,
        after: String,
    },
}

impl FieldChange {
    pub fn field(&self) -> &str {
        match self {
            FieldChange::Added { field, .. }
            | FieldChange::Removed { field, .. }
            | FieldChange::Modified { field, .. } => field,
        }
    }
}
