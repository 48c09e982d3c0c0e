//! Shape of the command that removes a backup
//!
//! The engine only builds argument vectors; running them is the caller's job.

use crate::backup::Backup;
use crate::error::{Result, RotateError};
use std::fmt;
use std::str::FromStr;

/// Default removal command (recursive, forced)
pub const DEFAULT_REMOVAL_COMMAND: [&str; 2] = ["rm", "-fR"];

/// `ionice` scheduling class for removal commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoSchedulingClass {
    Realtime,
    BestEffort,
    Idle,
}

impl IoSchedulingClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            IoSchedulingClass::Realtime => "realtime",
            IoSchedulingClass::BestEffort => "best-effort",
            IoSchedulingClass::Idle => "idle",
        }
    }
}

impl FromStr for IoSchedulingClass {
    type Err = RotateError;

    /// Class names or the numeric ids `ionice` itself understands
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realtime" | "1" => Ok(IoSchedulingClass::Realtime),
            "best-effort" | "2" => Ok(IoSchedulingClass::BestEffort),
            "idle" | "3" => Ok(IoSchedulingClass::Idle),
            _ => Err(RotateError::InvalidIoClass(s.to_string())),
        }
    }
}

impl fmt::Display for IoSchedulingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Removal program plus optional I/O priority wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalCommand {
    program: Vec<String>,
    io_class: Option<IoSchedulingClass>,
}

impl RemovalCommand {
    pub fn new<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program: Vec<String> = argv.into_iter().map(Into::into).collect();
        if program.is_empty() {
            return Err(RotateError::EmptyRemovalCommand);
        }
        Ok(Self {
            program,
            io_class: None,
        })
    }

    /// Parse a whitespace separated command line (`"rmdir"`, `"echo Deleting"`)
    pub fn parse(command_line: &str) -> Result<Self> {
        Self::new(command_line.split_whitespace())
    }

    pub fn with_io_class(mut self, io_class: Option<IoSchedulingClass>) -> Self {
        self.io_class = io_class;
        self
    }

    pub fn program(&self) -> &[String] {
        &self.program
    }

    pub fn io_class(&self) -> Option<IoSchedulingClass> {
        self.io_class
    }

    pub fn is_default(&self) -> bool {
        self.program.iter().map(String::as_str).eq(DEFAULT_REMOVAL_COMMAND)
    }

    /// Full argument vector that removes `backup`
    pub fn argv_for(&self, backup: &Backup) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.program.len() + 4);
        if let Some(class) = self.io_class {
            argv.extend(["ionice".to_string(), "--class".to_string(), class.to_string()]);
        }
        argv.extend(self.program.iter().cloned());
        argv.push(backup.path().to_string());
        argv
    }
}

impl Default for RemovalCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_REMOVAL_COMMAND.iter().map(|s| s.to_string()).collect(),
            io_class: None,
        }
    }
}
