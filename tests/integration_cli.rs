//! Integration tests for the `compose-graph` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn compose_graph() -> Command {
    Command::cargo_bin("compose-graph").unwrap()
}

#[test]
fn test_dot_output_to_stdout() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("compose.yaml"),
        "services:\n  web:\n    image: nginx\n    ports:\n      - \"80:80\"\n",
    )
    .unwrap();

    compose_graph()
        .arg(dir.path().join("compose.yaml"))
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph compose {"))
        .stdout(predicate::str::contains("cluster_services"))
        .stdout(predicate::str::contains("service_web"));
}

#[test]
fn test_dot_output_to_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("compose.yaml"),
        "services:\n  web:\n    image: nginx\n",
    )
    .unwrap();
    let out = dir.path().join("graph.dot");

    compose_graph()
        .arg(dir.path().join("compose.yaml"))
        .arg("--quiet")
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("digraph compose"));
}

#[test]
fn test_yaml_format_dumps_merged_services() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("override.yaml"),
        "services:\n  web:\n    restart: always\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("compose.yaml"),
        "include:\n  - path:\n      - override.yaml\nservices:\n  web:\n    image: nginx\n",
    )
    .unwrap();

    compose_graph()
        .arg(dir.path().join("compose.yaml"))
        .arg("--quiet")
        .arg("--format")
        .arg("yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("image: nginx"))
        .stdout(predicate::str::contains("restart: always"));
}

#[test]
fn test_missing_file_fails_with_suggestion() {
    compose_graph()
        .arg("no-such-compose.yaml")
        .arg("--quiet")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("Suggestion:"));
}

#[test]
fn test_expansion_uses_process_environment() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("compose.yaml"),
        "services:\n  web:\n    ports:\n      - \"${WEB_PORT_HOST}:80\"\n",
    )
    .unwrap();

    compose_graph()
        .arg(dir.path().join("compose.yaml"))
        .arg("--quiet")
        .env("WEB_PORT_HOST", "8080")
        .assert()
        .success()
        .stdout(predicate::str::contains("web__8080__80"));
}

#[test]
fn test_no_expand_vars_keeps_references() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("compose.yaml"),
        "services:\n  web:\n    ports:\n      - \"${WEB_PORT_HOST}:80\"\n",
    )
    .unwrap();

    compose_graph()
        .arg(dir.path().join("compose.yaml"))
        .arg("--quiet")
        .arg("--no-expand-vars")
        .env("WEB_PORT_HOST", "8080")
        .assert()
        .success()
        .stdout(predicate::str::contains("${WEB_PORT_HOST}"));
}

#[test]
fn test_env_file_feeds_expansion() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "ENV_FILE_PORT=9000\n").unwrap();
    fs::write(
        dir.path().join("compose.yaml"),
        "services:\n  web:\n    ports:\n      - \"${ENV_FILE_PORT}:80\"\n",
    )
    .unwrap();

    compose_graph()
        .arg(dir.path().join("compose.yaml"))
        .arg("--quiet")
        .arg("--env-file")
        .arg(dir.path().join(".env"))
        .assert()
        .success()
        .stdout(predicate::str::contains("web__9000__80"));
}

#[test]
fn test_cyclic_include_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.yaml"),
        "include:\n  - path:\n      - b.yaml\nservices: {}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("b.yaml"),
        "include:\n  - path:\n      - a.yaml\nservices: {}\n",
    )
    .unwrap();

    compose_graph()
        .arg(dir.path().join("a.yaml"))
        .arg("--quiet")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cyclic include"));
}
