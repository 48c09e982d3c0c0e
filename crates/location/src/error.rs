//! Location error types

use thiserror::Error;

/// Errors raised while checking, listing or acting on a location
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("The directory {0} doesn't exist!")]
    Missing(String),

    #[error(
        "The directory {0} isn't accessible, most likely because it doesn't exist or because \
         of permissions. If you're sure the directory exists you can use the --use-sudo option."
    )]
    NotAccessible(String),

    #[error("The directory {location} isn't readable{}", sudo_hint(.superuser))]
    NotReadable { location: String, superuser: bool },

    #[error("The directory {location} isn't writable{}", sudo_hint(.superuser))]
    NotWritable { location: String, superuser: bool },

    #[error("External command failed with {}: {command}{}", exit_status(.status), stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list {location}: {source}")]
    Walk {
        location: String,
        #[source]
        source: walkdir::Error,
    },
}

pub type Result<T> = std::result::Result<T, LocationError>;

fn sudo_hint(superuser: &bool) -> &'static str {
    if *superuser {
        "!"
    } else {
        ", most likely because of permissions. Consider using the --use-sudo option."
    }
}

fn exit_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(" ({})", stderr)
    }
}
