//! Backup locations
//!
//! A location is a directory, local or on a remote host, that holds backups.

use crate::context::CommandContext;
use crate::error::{LocationError, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use rotate_core::Candidate;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct Location {
    context: CommandContext,
    directory: String,
}

/// Groups deletions that contend for the same disk
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AffinityKey {
    pub ssh_alias: Option<String>,
    pub mount_point: Option<String>,
}

impl Location {
    pub fn new(context: CommandContext, directory: impl Into<String>) -> Self {
        Self {
            context,
            directory: directory.into(),
        }
    }

    /// Parse `DIRECTORY` or `SSH_ALIAS:DIRECTORY`
    ///
    /// The prefix is only taken as an ssh alias when both halves are
    /// non-empty and the prefix contains no `/`. Local directories get `~`
    /// expanded.
    pub fn parse(value: &str) -> Self {
        if let Some((alias, directory)) = value.split_once(':') {
            if !alias.is_empty() && !directory.is_empty() && !alias.contains('/') {
                return Self::new(CommandContext::remote(alias), directory);
            }
        }
        Self::new(CommandContext::local(), expand_home(value))
    }

    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.context = self.context.with_sudo(sudo);
        self
    }

    pub fn with_ssh_user(mut self, ssh_user: Option<String>) -> Self {
        self.context = self.context.with_ssh_user(ssh_user);
        self
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn is_remote(&self) -> bool {
        self.context.is_remote()
    }

    /// Whether the filesystem can be inspected without running commands
    fn is_direct(&self) -> bool {
        !self.context.is_remote() && !self.context.sudo()
    }

    fn key(&self) -> (Option<&str>, String) {
        (self.context.ssh_alias(), normalize(&self.directory))
    }

    pub async fn is_directory(&self) -> Result<bool> {
        if self.is_direct() {
            return Ok(Path::new(&self.directory).is_dir());
        }
        self.context.test(&["test", "-d", self.directory.as_str()]).await
    }

    pub async fn is_readable(&self) -> Result<bool> {
        if self.is_direct() {
            return Ok(access(&self.directory, nix::unistd::AccessFlags::R_OK));
        }
        self.context.test(&["test", "-r", self.directory.as_str()]).await
    }

    pub async fn is_writable(&self) -> Result<bool> {
        if self.is_direct() {
            return Ok(access(&self.directory, nix::unistd::AccessFlags::W_OK));
        }
        self.context.test(&["test", "-w", self.directory.as_str()]).await
    }

    /// Fail unless the location is an existing directory
    ///
    /// Without superuser privileges a missing parent permission looks the
    /// same as a missing directory, so the error says so.
    pub async fn ensure_exists(&self) -> Result<()> {
        if self.is_directory().await? {
            return Ok(());
        }
        if self.context.have_superuser_privileges() {
            Err(LocationError::Missing(self.to_string()))
        } else {
            Err(LocationError::NotAccessible(self.to_string()))
        }
    }

    pub async fn ensure_readable(&self) -> Result<()> {
        self.ensure_exists().await?;
        if self.is_readable().await? {
            return Ok(());
        }
        Err(LocationError::NotReadable {
            location: self.to_string(),
            superuser: self.context.have_superuser_privileges(),
        })
    }

    pub async fn ensure_writable(&self) -> Result<()> {
        self.ensure_exists().await?;
        if self.is_writable().await? {
            return Ok(());
        }
        Err(LocationError::NotWritable {
            location: self.to_string(),
            superuser: self.context.have_superuser_privileges(),
        })
    }

    /// List candidate backups in natural path order
    ///
    /// Without `recursive` every direct child counts (backups are often
    /// directories); with it, regular files at any depth. `with_mtime`
    /// attaches modification times for stat based rotation.
    pub async fn list_entries(&self, recursive: bool, with_mtime: bool) -> Result<Vec<Candidate>> {
        let mut entries = if self.is_direct() {
            self.walk(recursive, with_mtime)?
        } else {
            self.find(recursive, with_mtime).await?
        };
        entries.sort_by(|a, b| natural_cmp(&a.path, &b.path));
        debug!("Listed {} entries in {}", entries.len(), self);
        Ok(entries)
    }

    fn walk(&self, recursive: bool, with_mtime: bool) -> Result<Vec<Candidate>> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
        {
            let entry = entry.map_err(|source| LocationError::Walk {
                location: self.to_string(),
                source,
            })?;
            if recursive && !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path().to_string_lossy().into_owned();
            let modified = if with_mtime {
                entry
                    .metadata()
                    .ok()
                    .and_then(|metadata| metadata.modified().ok())
                    .map(local_time)
            } else {
                None
            };
            entries.push(Candidate { path, modified });
        }

        Ok(entries)
    }

    async fn find(&self, recursive: bool, with_mtime: bool) -> Result<Vec<Candidate>> {
        let mut argv = vec!["find", self.directory.as_str(), "-mindepth", "1"];
        if !recursive {
            argv.extend(["-maxdepth", "1"]);
        } else {
            argv.extend(["-type", "f"]);
        }
        if with_mtime {
            argv.extend(["-printf", "%T@ %p\\0"]);
        } else {
            argv.push("-print0");
        }

        let output = self.context.capture(&argv).await?;
        let output = String::from_utf8_lossy(&output);

        Ok(output
            .split('\0')
            .filter(|record| !record.is_empty())
            .map(|record| {
                if with_mtime {
                    parse_find_record(record)
                } else {
                    Candidate::new(record)
                }
            })
            .collect())
    }

    /// Key used to serialize deletions on the same disk
    ///
    /// Falls back to the bare host when the mount point can't be determined.
    pub async fn affinity_key(&self) -> AffinityKey {
        let mount_point = if self.is_direct() {
            find_mount_point(Path::new(&self.directory))
                .map(|path| path.to_string_lossy().into_owned())
        } else {
            match self
                .context
                .capture(&["stat", "--format=%m", self.directory.as_str()])
                .await
            {
                Ok(output) => {
                    let mount = String::from_utf8_lossy(&output).trim().to_string();
                    (!mount.is_empty()).then_some(mount)
                }
                Err(err) => {
                    debug!("Failed to determine mount point of {}: {}", self, err);
                    None
                }
            }
        };

        AffinityKey {
            ssh_alias: self.context.ssh_alias().map(str::to_string),
            mount_point,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context.ssh_alias() {
            Some(alias) => write!(f, "{}:{}", alias, self.directory),
            None => write!(f, "{}", self.directory),
        }
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for AffinityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mount = self.mount_point.as_deref().unwrap_or("?");
        match &self.ssh_alias {
            Some(alias) => write!(f, "{}:{}", alias, mount),
            None => write!(f, "{}", mount),
        }
    }
}

fn access(path: &str, mode: nix::unistd::AccessFlags) -> bool {
    nix::unistd::access(path, mode).is_ok()
}

fn expand_home(directory: &str) -> String {
    let rest = match directory.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return directory.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.to_string_lossy(), rest),
        None => directory.to_string(),
    }
}

/// Lexically normalize a path: collapse separators, `.` and `..`
pub fn normalize(directory: &str) -> String {
    let absolute = directory.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in directory.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn local_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

fn parse_find_record(record: &str) -> Candidate {
    let Some((mtime, path)) = record.split_once(' ') else {
        return Candidate::new(record);
    };
    let modified = mtime.parse::<f64>().ok().and_then(|seconds| {
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9) as u32;
        DateTime::from_timestamp(whole as i64, nanos).map(|utc| utc.with_timezone(&Local).naive_local())
    });
    Candidate {
        path: path.to_string(),
        modified,
    }
}

/// Walk up from `directory` until the device id changes
fn find_mount_point(directory: &Path) -> Option<PathBuf> {
    let mut current = std::fs::canonicalize(directory).ok()?;
    let device = std::fs::metadata(&current).ok()?.dev();

    while let Some(parent) = current.parent() {
        match std::fs::metadata(parent) {
            Ok(metadata) if metadata.dev() == device => current = parent.to_path_buf(),
            _ => break,
        }
    }

    Some(current)
}

/// Compare paths with embedded numbers by numeric value
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let mut x_digits = String::new();
                while let Some(c) = left.next_if(char::is_ascii_digit) {
                    x_digits.push(c);
                }
                let mut y_digits = String::new();
                while let Some(c) = right.next_if(char::is_ascii_digit) {
                    y_digits.push(c);
                }
                let x_trimmed = x_digits.trim_start_matches('0');
                let y_trimmed = y_digits.trim_start_matches('0');
                let ordering = x_trimmed
                    .len()
                    .cmp(&y_trimmed.len())
                    .then_with(|| x_trimmed.cmp(y_trimmed))
                    .then_with(|| x_digits.len().cmp(&y_digits.len()));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                left.next();
                right.next();
            }
        }
    }
}
