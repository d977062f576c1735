use pfconfig_core::{diff_fields, format_summary, format_text, FieldChange, FieldMap};

fn map(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn formats_each_change_kind() {
    let before = map(&[("hostname", "fw1"), ("agentenabled", "on"), ("timeout", "3")]);
    let after = map(&[("hostname", "fw2"), ("timeout", "3"), ("tlscaos", "on")]);

    let changes = diff_fields(&before, &after, &["hostname"]);
    assert_eq!(changes.len(), 3);

    let text = format_text(&changes);
    assert!(text.contains("~ hostname"));
    assert!(text.contains("  after:  \"fw2\""));
    assert!(text.contains("- agentenabled: \"on\""));
    assert!(text.contains("+ tlscaos: \"on\""));

    assert_eq!(format_summary(&changes), "added=1 removed=1 modified=1");

    let json = serde_json::to_value(&changes).expect("serialize");
    assert_eq!(json[0]["type"], "Modified");
    assert_eq!(json[0]["field"], "hostname");
}

#[test]
fn unchanged_maps_format_as_empty() {
    let same = map(&[("hostname", "fw1")]);
    let changes: Vec<FieldChange> = diff_fields(&same, &same, &[]);
    assert!(format_text(&changes).is_empty());
    assert!(format_summary(&changes).starts_with("added=0"));
}
