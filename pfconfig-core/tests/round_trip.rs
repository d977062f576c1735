use std::path::PathBuf;

use pfconfig_core::{parse, parse_file, write, ConfigDocument};
use pretty_assertions::assert_eq;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn parse_write_parse_round_trip_preserves_tree_shape() {
    let first = parse_file(&fixture("fixtures/pfsense-zabbix-configured.xml"))
        .expect("initial parse should succeed");

    let written = write(&first).expect("write should succeed");
    let second = parse(&written).expect("re-parse should succeed");

    assert_eq!(first, second);
}

#[test]
fn document_save_stamps_revision_and_rewrites_file() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("config.xml");
    std::fs::copy(fixture("fixtures/pfsense-base.xml"), &path).expect("copy fixture");

    let mut doc = ConfigDocument::load(&path).expect("load should succeed");
    doc.scope_mut(&["system"])
        .expect("system scope")
        .set_child_text("hostname", "fw-lab");
    doc.save("changed hostname", "pfsense-zabbix")
        .expect("save should succeed");

    let reloaded = parse_file(&path).expect("re-parse should succeed");
    assert_eq!(reloaded.get_text(&["system", "hostname"]), Some("fw-lab"));
    assert_eq!(
        reloaded.get_text(&["revision", "description"]),
        Some("changed hostname")
    );
    assert_eq!(
        reloaded.get_text(&["revision", "username"]),
        Some("pfsense-zabbix")
    );
    assert!(!dir.path().join("config.xml.tmp").exists());
}
