//! Command execution context
//!
//! A context decides where and how an external command runs: locally or
//! over `ssh`, optionally through `sudo`. Commands are given as argument
//! vectors and only turned into a shell string when they cross `ssh`.

use crate::error::{LocationError, Result};
use std::fmt;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CommandContext {
    ssh_alias: Option<String>,
    ssh_user: Option<String>,
    sudo: bool,
}

impl CommandContext {
    /// Run commands on this host
    pub fn local() -> Self {
        Self::default()
    }

    /// Run commands on `ssh_alias` (anything `ssh` accepts as a destination)
    pub fn remote(ssh_alias: impl Into<String>) -> Self {
        Self {
            ssh_alias: Some(ssh_alias.into()),
            ..Self::default()
        }
    }

    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn with_ssh_user(mut self, ssh_user: Option<String>) -> Self {
        self.ssh_user = ssh_user;
        self
    }

    pub fn ssh_alias(&self) -> Option<&str> {
        self.ssh_alias.as_deref()
    }

    pub fn ssh_user(&self) -> Option<&str> {
        self.ssh_user.as_deref()
    }

    pub fn sudo(&self) -> bool {
        self.sudo
    }

    pub fn is_remote(&self) -> bool {
        self.ssh_alias.is_some()
    }

    /// Whether commands run in this context are privileged
    ///
    /// Only known for certain with `sudo` or when running locally as root.
    pub fn have_superuser_privileges(&self) -> bool {
        self.sudo || (!self.is_remote() && nix::unistd::geteuid().is_root())
    }

    /// The argument vector that is actually spawned for `argv`
    pub fn command_line<S: AsRef<str>>(&self, argv: &[S]) -> Vec<String> {
        let mut inner: Vec<String> = Vec::with_capacity(argv.len() + 1);
        if self.sudo {
            inner.push("sudo".to_string());
        }
        inner.extend(argv.iter().map(|arg| arg.as_ref().to_string()));

        let Some(alias) = &self.ssh_alias else {
            return inner;
        };

        let mut outer = vec![
            "ssh".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ];
        if let Some(user) = &self.ssh_user {
            outer.push("-l".to_string());
            outer.push(user.clone());
        }
        outer.push(alias.clone());
        outer.push("--".to_string());
        outer.push(
            inner
                .iter()
                .map(|arg| quote(arg))
                .collect::<Vec<_>>()
                .join(" "),
        );
        outer
    }

    /// Run a command and fail unless it exits successfully
    pub async fn execute<S: AsRef<str>>(&self, argv: &[S]) -> Result<()> {
        self.run(argv).await.map(|_| ())
    }

    /// Run a command and return its standard output
    pub async fn capture<S: AsRef<str>>(&self, argv: &[S]) -> Result<Vec<u8>> {
        self.run(argv).await.map(|output| output.stdout)
    }

    /// Run a command and report whether it exited successfully
    ///
    /// Only a failure to start the command is an error.
    pub async fn test<S: AsRef<str>>(&self, argv: &[S]) -> Result<bool> {
        let output = self.spawn(argv).await?;
        Ok(output.status.success())
    }

    async fn run<S: AsRef<str>>(&self, argv: &[S]) -> Result<Output> {
        let output = self.spawn(argv).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(LocationError::CommandFailed {
                command: self.render(argv),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }

    async fn spawn<S: AsRef<str>>(&self, argv: &[S]) -> Result<Output> {
        let command_line = self.command_line(argv);
        let Some((program, args)) = command_line.split_first() else {
            return Err(LocationError::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        debug!("Executing external command: {}", render(&command_line));

        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| LocationError::Spawn {
                command: render(&command_line),
                source,
            })
    }

    fn render<S: AsRef<str>>(&self, argv: &[S]) -> String {
        render(&self.command_line(argv))
    }
}

impl fmt::Display for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.ssh_alias, &self.ssh_user) {
            (Some(alias), Some(user)) => write!(f, "{}@{}", user, alias)?,
            (Some(alias), None) => write!(f, "{}", alias)?,
            (None, _) => write!(f, "local")?,
        }
        if self.sudo {
            write!(f, " (sudo)")?;
        }
        Ok(())
    }
}

/// Quote one argument for a POSIX shell
pub fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}

fn render(argv: &[String]) -> String {
    argv.iter().map(|arg| quote(arg)).collect::<Vec<_>>().join(" ")
}
