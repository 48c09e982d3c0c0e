//! Rotation of the nightly sample backup set

use crate::common::*;
use std::collections::BTreeSet;
use tempfile::TempDir;

const SCHEME: [&str; 5] = [
    "--hourly=24",
    "--daily=7",
    "--weekly=4",
    "--monthly=12",
    "--yearly=always",
];

fn expected_with(extra: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    let mut expected = names(&EXPECTED_PRESERVED);
    expected.insert("some-random-directory".to_string());
    expected.extend(extra);
    expected
}

#[test]
fn test_rotate_sample_set() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    std::fs::create_dir(&root).unwrap();
    create_sample_backup_set(&root);

    let result = RotateCommand::new(home.path())
        .args(&["--verbose"])
        .args(&SCHEME)
        .arg_path(&root)
        .assert_success()
        .unwrap();

    assert_eq!(list_names(&root), expected_with([]));
    assert!(result.contains_stderr("Deleting"));
    assert!(result.contains_stderr("Preserving"));
    assert!(result.contains_stdout("preserved"));
}

#[test]
fn test_rotate_sample_set_in_parallel() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    std::fs::create_dir(&root).unwrap();
    create_sample_backup_set(&root);

    RotateCommand::new(home.path())
        .args(&SCHEME)
        .args(&["--parallel"])
        .arg_path(&root)
        .assert_success()
        .unwrap();

    assert_eq!(list_names(&root), expected_with([]));
}

#[test]
fn test_include_list() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    std::fs::create_dir(&root).unwrap();
    create_sample_backup_set(&root);

    RotateCommand::new(home.path())
        .args(&SCHEME)
        .args(&["--include=2014-*"])
        .arg_path(&root)
        .assert_success()
        .unwrap();

    // Backups outside the include list are left alone
    let untouched = SAMPLE_BACKUP_SET
        .iter()
        .filter(|name| !name.starts_with("2014-"))
        .map(|name| name.to_string());
    assert_eq!(list_names(&root), expected_with(untouched));
}

#[test]
fn test_exclude_list() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    std::fs::create_dir(&root).unwrap();
    create_sample_backup_set(&root);

    RotateCommand::new(home.path())
        .args(&SCHEME)
        .args(&["--exclude=2014-05-*"])
        .arg_path(&root)
        .assert_success()
        .unwrap();

    let untouched = SAMPLE_BACKUP_SET
        .iter()
        .filter(|name| name.starts_with("2014-05-"))
        .map(|name| name.to_string());
    assert_eq!(list_names(&root), expected_with(untouched));
}

#[test]
fn test_dry_run_deletes_nothing() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    std::fs::create_dir(&root).unwrap();
    create_sample_backup_set(&root);
    let before = list_names(&root);

    let result = RotateCommand::new(home.path())
        .args(&SCHEME)
        .args(&["--dry-run"])
        .arg_path(&root)
        .assert_success()
        .unwrap();

    assert_eq!(list_names(&root), before);
    assert!(result.contains_stderr("Performing a dry run"));
    assert!(result.contains_stderr("Deleting"));
    assert!(result.contains_stdout("to delete"));
}

#[test]
fn test_second_run_has_nothing_to_do() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    std::fs::create_dir(&root).unwrap();
    create_sample_backup_set(&root);

    for _ in 0..2 {
        RotateCommand::new(home.path())
            .args(&SCHEME)
            .arg_path(&root)
            .assert_success()
            .unwrap();
    }
    let result = RotateCommand::new(home.path())
        .args(&SCHEME)
        .arg_path(&root)
        .assert_success()
        .unwrap();

    assert_eq!(list_names(&root), expected_with([]));
    assert!(result.contains_stderr("Nothing to do! (all backups preserved)"));
}
