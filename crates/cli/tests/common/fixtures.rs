//! Backup set fixtures

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Nightly backups from 2013-10-10 to 2014-07-02
pub const SAMPLE_BACKUP_SET: [&str; 266] = [
    "2013-10-10@20:07", "2013-10-11@20:06", "2013-10-12@20:06", "2013-10-13@20:07", "2013-10-14@20:06",
    "2013-10-15@20:06", "2013-10-16@20:06", "2013-10-17@20:07", "2013-10-18@20:06", "2013-10-19@20:06",
    "2013-10-20@20:05", "2013-10-21@20:07", "2013-10-22@20:06", "2013-10-23@20:06", "2013-10-24@20:06",
    "2013-10-25@20:06", "2013-10-26@20:06", "2013-10-27@20:06", "2013-10-28@20:07", "2013-10-29@20:06",
    "2013-10-30@20:07", "2013-10-31@20:07", "2013-11-01@20:06", "2013-11-02@20:06", "2013-11-03@20:05",
    "2013-11-04@20:07", "2013-11-05@20:06", "2013-11-06@20:07", "2013-11-07@20:07", "2013-11-08@20:07",
    "2013-11-09@20:06", "2013-11-10@20:06", "2013-11-11@20:07", "2013-11-12@20:06", "2013-11-13@20:07",
    "2013-11-14@20:06", "2013-11-15@20:07", "2013-11-16@20:06", "2013-11-17@20:07", "2013-11-18@20:07",
    "2013-11-19@20:06", "2013-11-20@20:07", "2013-11-21@20:06", "2013-11-22@20:06", "2013-11-23@20:07",
    "2013-11-24@20:06", "2013-11-25@20:07", "2013-11-26@20:06", "2013-11-27@20:07", "2013-11-28@20:06",
    "2013-11-29@20:07", "2013-11-30@20:06", "2013-12-01@20:07", "2013-12-02@20:06", "2013-12-03@20:07",
    "2013-12-04@20:07", "2013-12-05@20:06", "2013-12-06@20:07", "2013-12-07@20:06", "2013-12-08@20:06",
    "2013-12-09@20:07", "2013-12-10@20:06", "2013-12-11@20:07", "2013-12-12@20:07", "2013-12-13@20:07",
    "2013-12-14@20:06", "2013-12-15@20:06", "2013-12-16@20:07", "2013-12-17@20:06", "2013-12-18@20:07",
    "2013-12-19@20:07", "2013-12-20@20:08", "2013-12-21@20:06", "2013-12-22@20:07", "2013-12-23@20:08",
    "2013-12-24@20:07", "2013-12-25@20:07", "2013-12-26@20:06", "2013-12-27@20:07", "2013-12-28@20:06",
    "2013-12-29@20:07", "2013-12-30@20:07", "2013-12-31@20:06", "2014-01-01@20:07", "2014-01-02@20:07",
    "2014-01-03@20:08", "2014-01-04@20:06", "2014-01-05@20:07", "2014-01-06@20:07", "2014-01-07@20:06",
    "2014-01-08@20:09", "2014-01-09@20:07", "2014-01-10@20:07", "2014-01-11@20:06", "2014-01-12@20:07",
    "2014-01-13@20:07", "2014-01-14@20:07", "2014-01-15@20:06", "2014-01-16@20:06", "2014-01-17@20:04",
    "2014-01-18@20:02", "2014-01-19@20:02", "2014-01-20@20:04", "2014-01-21@20:04", "2014-01-22@20:04",
    "2014-01-23@20:05", "2014-01-24@20:08", "2014-01-25@20:03", "2014-01-26@20:02", "2014-01-27@20:08",
    "2014-01-28@20:07", "2014-01-29@20:07", "2014-01-30@20:08", "2014-01-31@20:04", "2014-02-01@20:05",
    "2014-02-02@20:03", "2014-02-03@20:05", "2014-02-04@20:06", "2014-02-05@20:07", "2014-02-06@20:06",
    "2014-02-07@20:05", "2014-02-08@20:06", "2014-02-09@20:04", "2014-02-10@20:07", "2014-02-11@20:07",
    "2014-02-12@20:07", "2014-02-13@20:06", "2014-02-14@20:06", "2014-02-15@20:05", "2014-02-16@20:04",
    "2014-02-17@20:06", "2014-02-18@20:04", "2014-02-19@20:08", "2014-02-20@20:06", "2014-02-21@20:07",
    "2014-02-22@20:05", "2014-02-23@20:06", "2014-02-24@20:05", "2014-02-25@20:06", "2014-02-26@20:04",
    "2014-02-27@20:05", "2014-02-28@20:03", "2014-03-01@20:04", "2014-03-02@20:01", "2014-03-03@20:05",
    "2014-03-04@20:06", "2014-03-05@20:05", "2014-03-06@20:24", "2014-03-07@20:03", "2014-03-08@20:04",
    "2014-03-09@20:01", "2014-03-10@20:05", "2014-03-11@20:05", "2014-03-12@20:05", "2014-03-13@20:05",
    "2014-03-14@20:04", "2014-03-15@20:04", "2014-03-16@20:02", "2014-03-17@20:04", "2014-03-18@20:06",
    "2014-03-19@20:06", "2014-03-20@20:06", "2014-03-21@20:04", "2014-03-22@20:03", "2014-03-23@20:01",
    "2014-03-24@20:03", "2014-03-25@20:05", "2014-03-26@20:03", "2014-03-27@20:04", "2014-03-28@20:03",
    "2014-03-29@20:03", "2014-03-30@20:01", "2014-03-31@20:04", "2014-04-01@20:03", "2014-04-02@20:05",
    "2014-04-03@20:03", "2014-04-04@20:04", "2014-04-05@20:02", "2014-04-06@20:02", "2014-04-07@20:02",
    "2014-04-08@20:04", "2014-04-09@20:04", "2014-04-10@20:04", "2014-04-11@20:04", "2014-04-12@20:03",
    "2014-04-13@20:01", "2014-04-14@20:05", "2014-04-15@20:05", "2014-04-16@20:06", "2014-04-17@20:05",
    "2014-04-18@20:06", "2014-04-19@20:02", "2014-04-20@20:01", "2014-04-21@20:01", "2014-04-22@20:06",
    "2014-04-23@20:06", "2014-04-24@20:05", "2014-04-25@20:04", "2014-04-26@20:02", "2014-04-27@20:02",
    "2014-04-28@20:05", "2014-04-29@20:05", "2014-04-30@20:05", "2014-05-01@20:06", "2014-05-02@20:05",
    "2014-05-03@20:03", "2014-05-04@20:01", "2014-05-05@20:06", "2014-05-06@20:06", "2014-05-07@20:05",
    "2014-05-08@20:03", "2014-05-09@20:01", "2014-05-10@20:01", "2014-05-11@20:01", "2014-05-12@20:05",
    "2014-05-13@20:06", "2014-05-14@20:04", "2014-05-15@20:06", "2014-05-16@20:05", "2014-05-17@20:02",
    "2014-05-18@20:01", "2014-05-19@20:02", "2014-05-20@20:04", "2014-05-21@20:03", "2014-05-22@20:02",
    "2014-05-23@20:02", "2014-05-24@20:01", "2014-05-25@20:01", "2014-05-26@20:05", "2014-05-27@20:03",
    "2014-05-28@20:03", "2014-05-29@20:01", "2014-05-30@20:02", "2014-05-31@20:02", "2014-06-01@20:01",
    "2014-06-02@20:05", "2014-06-03@20:02", "2014-06-04@20:03", "2014-06-05@20:03", "2014-06-06@20:02",
    "2014-06-07@20:01", "2014-06-08@20:01", "2014-06-09@20:01", "2014-06-10@20:02", "2014-06-11@20:02",
    "2014-06-12@20:03", "2014-06-13@20:05", "2014-06-14@20:01", "2014-06-15@20:01", "2014-06-16@20:02",
    "2014-06-17@20:01", "2014-06-18@20:01", "2014-06-19@20:04", "2014-06-20@20:02", "2014-06-21@20:02",
    "2014-06-22@20:01", "2014-06-23@20:04", "2014-06-24@20:06", "2014-06-25@20:03", "2014-06-26@20:04",
    "2014-06-27@20:02", "2014-06-28@20:02", "2014-06-29@20:01", "2014-06-30@20:03", "2014-07-01@20:02",
    "2014-07-02@20:03",
];

/// Survivors of hourly=24, daily=7, weekly=4, monthly=12, yearly=always
pub const EXPECTED_PRESERVED: [&str; 19] = [
    "2013-10-10@20:07", // monthly, yearly
    "2013-11-01@20:06", // monthly
    "2013-12-01@20:07", // monthly
    "2014-01-01@20:07", // monthly, yearly
    "2014-02-01@20:05", // monthly
    "2014-03-01@20:04", // monthly
    "2014-04-01@20:03", // monthly
    "2014-05-01@20:06", // monthly
    "2014-06-01@20:01", // monthly
    "2014-06-09@20:01", // weekly
    "2014-06-16@20:02", // weekly
    "2014-06-23@20:04", // weekly
    "2014-06-26@20:04", // daily
    "2014-06-27@20:02", // daily
    "2014-06-28@20:02", // daily
    "2014-06-29@20:01", // daily
    "2014-06-30@20:03", // daily, weekly
    "2014-07-01@20:02", // daily, monthly
    "2014-07-02@20:03", // hourly, daily
];

/// Create every sample backup (as a directory) plus an unrelated directory
pub fn create_sample_backup_set(root: &Path) {
    for name in SAMPLE_BACKUP_SET {
        fs::create_dir(root.join(name)).unwrap();
    }
    fs::create_dir(root.join("some-random-directory")).unwrap();
}

/// Create empty directories named after `names`
pub fn create_backups(root: &Path, names: &[&str]) {
    for name in names {
        fs::create_dir(root.join(name)).unwrap();
    }
}

/// File names currently present in `root`
pub fn list_names(root: &Path) -> BTreeSet<String> {
    fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

pub fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|name| name.to_string()).collect()
}
