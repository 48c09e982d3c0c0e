//! Locations and options from configuration files

use crate::common::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const GALERA: [&str; 3] = [
    "galera_backup_db4.sl.example.lab_2016-03-17_10-00",
    "galera_backup_db4.sl.example.lab_2016-03-17_12-00",
    "galera_backup_db4.sl.example.lab_2016-03-17_16-00",
];

fn write_config(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn test_rotate_configured_location() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    fs::create_dir(&root).unwrap();
    create_sample_backup_set(&root);

    let config = home.path().join("rotate-backups.toml");
    write_config(
        &config,
        &format!(
            r#"
            [[location]]
            path = "{}"
            hourly = 24
            daily = 7
            weekly = 4
            monthly = 12
            yearly = "always"
            "#,
            root.display()
        ),
    );

    RotateCommand::new(home.path())
        .args(&["--verbose", "--config"])
        .arg_path(&config)
        .assert_success()
        .unwrap();

    let mut expected = names(&EXPECTED_PRESERVED);
    expected.insert("some-random-directory".to_string());
    assert_eq!(list_names(&root), expected);
}

#[test]
fn test_default_config_file() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    fs::create_dir(&root).unwrap();
    create_backups(&root, &GALERA);

    write_config(
        &home.path().join(".config").join("rotate-backups.toml"),
        &format!(
            "[[location]]\npath = \"{}\"\nhourly = 3\ndaily = 1\n",
            root.display()
        ),
    );

    RotateCommand::new(home.path()).assert_success().unwrap();

    assert_eq!(list_names(&root), names(&[GALERA[0], GALERA[2]]));
}

#[test]
fn test_glob_location() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    for host in ["db1", "db2"] {
        fs::create_dir_all(root.join(host)).unwrap();
        create_backups(&root.join(host), &GALERA);
    }

    let config = home.path().join("rotate-backups.toml");
    write_config(
        &config,
        &format!(
            "[[location]]\npath = \"{}/*\"\nhourly = 3\ndaily = 1\n",
            root.display()
        ),
    );

    RotateCommand::new(home.path())
        .args(&["--config"])
        .arg_path(&config)
        .assert_success()
        .unwrap();

    for host in ["db1", "db2"] {
        assert_eq!(
            list_names(&root.join(host)),
            names(&[GALERA[0], GALERA[2]])
        );
    }
}

#[test]
fn test_config_overrides_command_line() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("backups");
    fs::create_dir(&root).unwrap();
    create_backups(&root, &GALERA);

    // The section enforces strict rotation although --relaxed is given
    let config = home.path().join("rotate-backups.toml");
    write_config(
        &config,
        &format!("[[location]]\npath = \"{}\"\nstrict = true\n", root.display()),
    );

    RotateCommand::new(home.path())
        .args(&["--hourly=3", "--daily=1", "--relaxed", "--config"])
        .arg_path(&config)
        .arg_path(&root)
        .assert_success()
        .unwrap();

    assert_eq!(list_names(&root), names(&[GALERA[0], GALERA[2]]));
}

#[test]
fn test_invalid_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("rotate-backups.toml");
    write_config(&config, "[[location]]\npath = \"/backups\"\ndaily = \"lots\"\n");

    let result = RotateCommand::new(home.path())
        .args(&["--config"])
        .arg_path(&config)
        .assert_failure()
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stderr("Invalid daily"));
}
