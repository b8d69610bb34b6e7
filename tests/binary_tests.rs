use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn port_for(store: &Path) -> Command {
    let mut cmd = Command::cargo_bin("port-for").unwrap();
    cmd.env_remove("PORT_FOR_CONFIG")
        .env("PORT_FOR_STORE", store);
    cmd
}

fn bind(store: &Path, name: &str) -> u16 {
    let output = port_for(store).args(["bind", name]).output().unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().parse().unwrap()
}

#[test]
fn test_bind_is_sticky_across_runs() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("port-for.conf");

    let first = bind(&store, "web");
    let second = bind(&store, "web");

    assert_eq!(first, second);
    let content = fs::read_to_string(&store).unwrap();
    assert!(content.contains(&format!("web = {}", first)));
}

#[test]
fn test_list_and_unbind() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("port-for.conf");
    fs::write(&store, "[DEFAULT]\nfoo = 37987\n").unwrap();

    port_for(&store)
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"foo\"").and(predicate::str::contains("37987")));

    port_for(&store)
        .args(["unbind", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foo unbound"));

    port_for(&store)
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foo").not());
}

#[test]
fn test_select_exact_and_disabled() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("port-for.conf");

    port_for(&store)
        .args(["select", "5000"])
        .assert()
        .success()
        .stdout("5000\n");

    port_for(&store)
        .args(["select", "-1"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_corrupt_store_exit_code() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("port-for.conf");
    fs::write(&store, "foo = nope\n").unwrap();

    port_for(&store).args(["bind", "web"]).assert().code(5);
    assert_eq!(fs::read_to_string(&store).unwrap(), "foo = nope\n");
}

#[test]
fn test_exhausted_exit_code() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("port-for.conf");

    // Everything below 1024 is reserved, so this range can never succeed
    port_for(&store)
        .args(["select", "100-200"])
        .assert()
        .code(3);
}

#[test]
fn test_invalid_config_exit_code() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("port-for.conf");
    let config = dir.path().join("settings.json");
    fs::write(&config, "{ not json").unwrap();

    port_for(&store)
        .arg("--config")
        .arg(&config)
        .arg("pool")
        .assert()
        .code(6);
}

#[test]
fn test_pool_count() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("port-for.conf");

    let output = port_for(&store).args(["pool", "--count"]).output().unwrap();

    assert!(output.status.success());
    let count: u32 = String::from_utf8(output.stdout).unwrap().trim().parse().unwrap();
    assert!(count > 1000);
}
