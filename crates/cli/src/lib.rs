//! rotate-backups command line library
//!
//! Configuration files, logging setup and the per location rotation driver
//! behind the `rotate-backups` binary.

pub mod config;
pub mod logging;
pub mod program;

pub use config::{Config, ConfigError, ConfiguredLocation, LocationOverrides};
pub use program::{LocationSettings, PreparedRotation, RotateBackups, RotationSummary};
