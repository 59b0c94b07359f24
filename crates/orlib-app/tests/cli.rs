use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// A scratch directory with an empty dashboard config, so runs never read
/// the user's own settings.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config = write(dir.path(), "dashboard.json", "{}");
    (dir, config)
}

fn orlib(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("orlib").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

const TABLE: &str = r#"{ "problems": [
    { "id": "p1", "title": "Problem 1", "module": "builtin:hello", "entry_point": "HelloWindow", "status": "complete" },
    { "id": "p4", "title": "Monitoring", "module": "modules/monitoring", "entry_point": "MainWindow", "status": "complete" },
    { "id": "p5", "title": "Problem 5", "module": "modules/slim", "entry_point": "MainWindow", "status": "incomplete" },
    { "id": "p6", "title": "Retired", "module": "modules/old", "entry_point": "MainWindow", "status": "unavailable" }
] }"#;

#[test]
fn list_prints_the_descriptor_table() {
    let (dir, config) = workspace();
    let modules = write(dir.path(), "modules.json", TABLE);

    let output = orlib(&config)
        .arg("--modules")
        .arg(&modules)
        .arg("--list")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let ids: Vec<_> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(ids, ["p1", "p4", "p5", "p6"]);
    assert!(stdout.contains(&dir.path().join("modules/monitoring").display().to_string()));
}

#[test]
fn missing_descriptor_file_fails_startup() {
    let (dir, config) = workspace();
    orlib(&config)
        .arg("--modules")
        .arg(dir.path().join("absent.json"))
        .arg("--list")
        .assert()
        .failure();
}

#[test]
fn duplicate_ids_fail_startup() {
    let (dir, config) = workspace();
    let modules = write(
        dir.path(),
        "modules.json",
        r#"{ "problems": [
            { "id": "p1", "title": "A", "module": "builtin:hello", "entry_point": "HelloWindow", "status": "complete" },
            { "id": "p1", "title": "B", "module": "builtin:hello", "entry_point": "HelloWindow", "status": "complete" }
        ] }"#,
    );
    orlib(&config)
        .arg("--modules")
        .arg(&modules)
        .arg("--list")
        .assert()
        .failure();
}

#[test]
fn malformed_config_fails_startup() {
    let dir = tempdir().unwrap();
    let config = write(dir.path(), "dashboard.json", "{ nope");
    orlib(&config).arg("--list").assert().failure();
}

#[test]
fn config_can_name_the_descriptor_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "problems.json", TABLE);
    let config = write(dir.path(), "dashboard.json", r#"{ "modules_file": "problems.json" }"#);
    let output = orlib(&config).arg("--list").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().starts_with("p1"));
}

#[test]
fn check_reports_unresolvable_modules() {
    let (dir, config) = workspace();
    let modules = write(dir.path(), "modules.json", TABLE);
    let output = orlib(&config)
        .arg("--modules")
        .arg(&modules)
        .arg("--check")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let verdicts: Vec<(&str, &str)> = stdout
        .lines()
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            Some((words.next()?, words.next()?))
        })
        .collect();
    // Incomplete and unavailable problems are not resolved.
    assert_eq!(verdicts, [("ok", "p1"), ("failed", "p4")]);
}

#[test]
fn check_passes_for_builtin_modules() {
    let (dir, config) = workspace();
    let modules = write(
        dir.path(),
        "modules.json",
        r#"{ "problems": [
            { "id": "hello", "title": "Sample", "module": "builtin:hello", "entry_point": "HelloWindow", "status": "complete" }
        ] }"#,
    );
    orlib(&config)
        .arg("--modules")
        .arg(&modules)
        .arg("--check")
        .assert()
        .success();
}

#[test]
fn write_default_bootstraps_a_loadable_table() {
    let (dir, config) = workspace();
    let target = dir.path().join("stock.json");
    orlib(&config)
        .arg("--write-default")
        .arg(&target)
        .assert()
        .success();

    let output = orlib(&config)
        .arg("--modules")
        .arg(&target)
        .arg("--list")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let ids: Vec<_> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(ids, ["p1", "p2", "p3", "p4", "p5", "hello"]);
}

#[test]
fn invalid_log_filters_are_rejected() {
    let (_dir, config) = workspace();
    orlib(&config)
        .arg("--log-filter")
        .arg("orlib=notalevel")
        .arg("--list")
        .assert()
        .failure();
}

#[test]
fn problems_without_a_status_are_not_checked() {
    let (dir, config) = workspace();
    let modules = write(
        dir.path(),
        "modules.json",
        r#"{ "problems": [
            { "id": "p2", "title": "Flows", "module": "modules/flows", "entry_point": "MainWindow" }
        ] }"#,
    );
    let listed = orlib(&config)
        .arg("--modules")
        .arg(&modules)
        .arg("--list")
        .output()
        .unwrap();
    assert!(String::from_utf8(listed.stdout).unwrap().contains("In progress"));

    // The missing library is never resolved, so the check passes.
    let checked = orlib(&config)
        .arg("--modules")
        .arg(&modules)
        .arg("--check")
        .output()
        .unwrap();
    assert!(checked.status.success());
    assert_eq!(String::from_utf8(checked.stdout).unwrap(), "");
}
