use crate::diff::result::FieldChange;

/// Format field changes as plain text, one or two lines per change.
pub fn format_text(changes: &[FieldChange]) -> String {
    let mut lines = Vec::with_capacity(changes.len());
    for change in changes {
        match change {
            FieldChange::Added { field, value } => lines.push(format!("+ {field}: {value:?}")),
            FieldChange::Removed { field, value } => lines.push(format!("- {field}: {value:?}")),
            FieldChange::Modified {
                field,
                before,
                after,
            } => {
                lines.push(format!("~ {field}"));
                lines.push(format!("  before: {before:?}"));
                lines.push(format!("  after:  {after:?}"));
            }
        }
    }
    lines.join("\n")
}

/// Format a one-line count of field changes.
pub fn format_summary(changes: &[FieldChange]) -> String {
    let mut added = 0;
    let mut removed = 0;
    let mut modified = 0;

    for change in changes {
        match change {
            FieldChange::Added { .. } => added += 1,
            FieldChange::Removed { .. } => removed += 1,
            FieldChange::Modified { .. } => modified += 1,
        }
    }

    format!("added={added} removed={removed} modified={modified}")
}
