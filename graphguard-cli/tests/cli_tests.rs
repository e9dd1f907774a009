//! Integration tests for the graphguard CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn graphguard_cmd() -> Command {
    Command::cargo_bin("graphguard").unwrap()
}

const DATASET: &str = r#"
@prefix : <http://ex.org/> .
:hasSalary rdfs:domain :Person .
:name rdfs:domain :Person .
:Doctor rdfs:subClassOf :Person .
:alice rdf:type :Doctor .
:alice :name "Alice" .
:alice :hasSalary "5000"^^xsd:integer .
:bob rdf:type :Person .
:bob :name "Bob" .
"#;

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help_command() {
    graphguard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("graphguard"))
        .stdout(predicate::str::contains("rewrite"))
        .stdout(predicate::str::contains("check-policy"))
        .stdout(predicate::str::contains("explain"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_version_command() {
    graphguard_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("Version"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_rewrite_help() {
    graphguard_cmd()
        .args(["rewrite", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dataset"))
        .stdout(predicate::str::contains("--policy"))
        .stdout(predicate::str::contains("--user"))
        .stdout(predicate::str::contains("--query"));
}

#[test]
fn test_check_policy_reports_accepted_and_skipped() {
    let dir = TempDir::new().unwrap();
    let policy = write_fixture(
        &dir,
        "policy.json",
        r#"[
            {"constraint": "node", "user": "guest", "node-type": ":Doctor"},
            {"constraint": "bogus", "user": "guest"}
        ]"#,
    );

    graphguard_cmd()
        .args(["check-policy", "--policy", policy.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Accepted entries: 1"))
        .stdout(predicate::str::contains("Skipped entries: 1"));
}

#[test]
fn test_check_policy_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");

    graphguard_cmd()
        .args(["check-policy", "--policy", missing.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_rewrite_node_class_deny_is_applied() {
    let dir = TempDir::new().unwrap();
    let dataset = write_fixture(&dir, "dataset.ttl", DATASET);
    let policy = write_fixture(
        &dir,
        "policy.json",
        r#"[{"constraint": "node", "user": "guest", "node-type": ":Doctor"}]"#,
    );
    let query = write_fixture(
        &dir,
        "query.rq",
        "SELECT ?x ?n WHERE { ?x :name ?n . }",
    );

    graphguard_cmd()
        .args([
            "rewrite",
            "--dataset",
            dataset.to_str().unwrap(),
            "--policy",
            policy.to_str().unwrap(),
            "--user",
            "guest",
            "--query",
            query.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("node pass"))
        .stdout(predicate::str::contains("NOT EXISTS"))
        .stdout(predicate::str::contains(":Doctor"));
}

#[test]
fn test_rewrite_instance_deny_drops_triple() {
    let dir = TempDir::new().unwrap();
    let dataset = write_fixture(&dir, "dataset.ttl", DATASET);
    let policy = write_fixture(
        &dir,
        "policy.json",
        r#"[{"constraint": "node", "user": "guest", "node-type": ":Person", "nodes": [":alice"]}]"#,
    );
    let query = write_fixture(
        &dir,
        "query.rq",
        "SELECT ?n WHERE { :alice :name ?n . }",
    );

    graphguard_cmd()
        .args([
            "rewrite",
            "--dataset",
            dataset.to_str().unwrap(),
            "--policy",
            policy.to_str().unwrap(),
            "--user",
            "guest",
            "--query",
            query.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed triple"));
}

#[test]
fn test_rewrite_json_format_emits_parseable_json() {
    let dir = TempDir::new().unwrap();
    let dataset = write_fixture(&dir, "dataset.ttl", DATASET);
    let policy = write_fixture(&dir, "policy.json", "[]");
    let query = write_fixture(&dir, "query.rq", "SELECT ?n WHERE { :alice :name ?n . }");

    let output = graphguard_cmd()
        .args([
            "rewrite",
            "--dataset",
            dataset.to_str().unwrap(),
            "--policy",
            policy.to_str().unwrap(),
            "--user",
            "guest",
            "--query",
            query.to_str().unwrap(),
            "--format",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(parsed.get("input_query").is_some());
    assert!(parsed.get("output_query").is_some());
    assert!(parsed.get("passes").is_some());
}

#[test]
fn test_rewrite_missing_dataset_flag_fails_with_config_error() {
    let dir = TempDir::new().unwrap();
    let policy = write_fixture(&dir, "policy.json", "[]");

    graphguard_cmd()
        .current_dir(dir.path())
        .args([
            "rewrite",
            "--policy",
            policy.to_str().unwrap(),
            "--user",
            "guest",
            "--query",
            "SELECT ?n WHERE { :alice :name ?n . }",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dataset"));
}

#[test]
fn test_explain_reports_type_bindings() {
    let dir = TempDir::new().unwrap();
    let dataset = write_fixture(&dir, "dataset.ttl", DATASET);
    let policy = write_fixture(&dir, "policy.json", "[]");
    let query = write_fixture(&dir, "query.rq", "SELECT ?x ?n WHERE { ?x :name ?n . }");

    graphguard_cmd()
        .args([
            "explain",
            "--dataset",
            dataset.to_str().unwrap(),
            "--policy",
            policy.to_str().unwrap(),
            "--user",
            "guest",
            "--query",
            query.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inferred type bindings"));
}

#[test]
fn test_invalid_command() {
    graphguard_cmd()
        .arg("invalid_command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_global_version_flag() {
    graphguard_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}
