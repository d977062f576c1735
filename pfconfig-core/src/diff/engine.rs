use std::collections::BTreeMap;

use crate::diff::result::FieldChange;

/// Flat `field -> value` snapshot of one configuration entry.
pub type FieldMap = BTreeMap<String, String>;

/// Diff two field maps.
///
/// Fields listed in `order` are reported first, in that order; any other
/// fields follow alphabetically.
pub fn diff_fields(before: &FieldMap, after: &FieldMap, order: &[&str]) -> Vec<FieldChange> {
    let mut out = Vec::new();
    for field in ordered_fields(before, after, order) {
        match (before.get(&field), after.get(&field)) {
            (Some(old), Some(new)) if old != new => out.push(FieldChange::Modified {
                field,
                before: old.clone(),
                after: new.clone(),
            }),
            (Some(old), None) => out.push(FieldChange::Removed {
                field,
                value: old.clone(),
            }),
            (None, Some(new)) => out.push(FieldChange::Added {
                field,
                value: new.clone(),
            }),
            _ => {}
        }
    }
    out
}

fn ordered_fields(before: &FieldMap, after: &FieldMap, order: &[&str]) -> Vec<String> {
    let mut fields: Vec<String> = order.iter().map(|f| f.to_string()).collect();
    for key in before.keys().chain(after.keys()) {
        if !fields.iter().any(|f| f == key) {
            fields.push(key.clone());
        }
    }
    let ranked = order.len();
    fields[ranked..].sort();
    fields
}
