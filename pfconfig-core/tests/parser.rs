use std::path::PathBuf;

use pfconfig_core::{parse_file, Lookup};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn parses_pfsense_root_and_package_scope() {
    let node = parse_file(&fixture("fixtures/pfsense-base.xml")).expect("parse should succeed");
    assert_eq!(node.tag, "pfsense");

    let packages = node
        .get_child("installedpackages")
        .expect("installedpackages should exist");
    assert_eq!(
        packages.get_text(&["package", "name"]),
        Some("zabbix-agent6")
    );
    assert_eq!(packages.lookup_child("zabbixagentlts"), Lookup::Absent);
}

#[test]
fn parses_cdata_and_empty_leaf_fields() {
    let node = parse_file(&fixture("fixtures/pfsense-zabbix-configured.xml"))
        .expect("parse should succeed");

    assert!(node
        .get_text(&["revision", "description"])
        .is_some_and(|d| d.contains("made changes")));

    let config = node
        .get_path(&["installedpackages", "zabbixagentlts", "config"])
        .expect("config should exist");
    let fields = config.leaf_map();
    assert_eq!(fields.get("agentenabled").map(String::as_str), Some("on"));
    assert_eq!(fields.get("tlspskfile").map(String::as_str), Some(""));
    assert!(!fields.contains_key("tlscaos"));
}

#[test]
fn detects_duplicate_package_entries() {
    let node = parse_file(&fixture("fixtures/pfsense-zabbix-duplicate.xml"))
        .expect("parse should succeed");
    let packages = node.get_child("installedpackages").expect("packages");
    assert_eq!(packages.lookup_child("zabbixagentlts"), Lookup::Multiple(2));
}
