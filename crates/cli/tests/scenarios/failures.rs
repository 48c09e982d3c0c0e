//! Invalid input and unusable locations

use crate::common::*;
use tempfile::TempDir;

fn sample_root(home: &TempDir) -> std::path::PathBuf {
    let root = home.path().join("backups");
    std::fs::create_dir(&root).unwrap();
    create_sample_backup_set(&root);
    root
}

#[test]
fn test_invalid_ionice_class() {
    let home = TempDir::new().unwrap();
    let root = sample_root(&home);
    let before = list_names(&root);

    let result = RotateCommand::new(home.path())
        .args(&["--ionice=urgent", "--daily=7"])
        .arg_path(&root)
        .assert_failure()
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stderr("Invalid I/O scheduling class"));
    assert_eq!(list_names(&root), before);
}

#[test]
fn test_invalid_retention_period() {
    let home = TempDir::new().unwrap();
    let root = sample_root(&home);

    let result = RotateCommand::new(home.path())
        .args(&["--daily=seven"])
        .arg_path(&root)
        .assert_failure()
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stderr("Invalid retention period"));
}

#[test]
fn test_zero_retention_deletes_nothing() {
    let home = TempDir::new().unwrap();
    let root = sample_root(&home);
    let before = list_names(&root);

    for value in ["--daily=0", "--hourly=1 - 1"] {
        let result = RotateCommand::new(home.path())
            .args(&[value])
            .arg_path(&root)
            .assert_failure()
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(result.contains_stderr("Invalid retention period"), "{value}");
    }
    assert_eq!(list_names(&root), before);
}

#[test]
fn test_empty_scheme_deletes_nothing() {
    let home = TempDir::new().unwrap();
    let root = sample_root(&home);
    let before = list_names(&root);

    let result = RotateCommand::new(home.path())
        .arg_path(&root)
        .assert_failure()
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stderr("Refusing to use empty rotation scheme"));
    assert_eq!(list_names(&root), before);
}

#[test]
fn test_missing_directory() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("does-not-exist");

    let result = RotateCommand::new(home.path())
        .args(&["--daily=7"])
        .arg_path(&missing)
        .assert_failure()
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert!(
        result.contains_stderr("isn't accessible") || result.contains_stderr("doesn't exist"),
        "{}",
        result.stderr
    );
}

#[test]
fn test_directory_without_backups() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("empty");
    std::fs::create_dir(&root).unwrap();

    let result = RotateCommand::new(home.path())
        .args(&["--daily=7"])
        .arg_path(&root)
        .assert_success()
        .unwrap();

    assert!(result.contains_stderr("No backups found"));
}

#[test]
fn test_missing_config_file() {
    let home = TempDir::new().unwrap();
    let root = sample_root(&home);

    let result = RotateCommand::new(home.path())
        .args(&["--daily=7", "--config", "/nonexistent/rotate-backups.toml"])
        .arg_path(&root)
        .assert_failure()
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stderr("Failed to read configuration file!"));
}

#[test]
fn test_usage_without_locations() {
    let home = TempDir::new().unwrap();

    let result = RotateCommand::new(home.path())
        .args(&["--daily=7"])
        .assert_success()
        .unwrap();

    assert!(result.contains_stdout("Usage"));
}
