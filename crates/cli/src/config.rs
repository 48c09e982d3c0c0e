//! Configuration files
//!
//! Locations, their rotation schemes and per location options live in TOML
//! files with one `[[location]]` table per directory:
//!
//! ```toml
//! [[location]]
//! path = "/backups/*"
//! daily = 7
//! weekly = 4
//! yearly = "always"
//! ionice = "idle"
//! ```
//!
//! Every default file that exists is loaded; sections from earlier files win.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use location::location::normalize;
use location::Location;
use rotate_core::{
    Frequency, IoSchedulingClass, RemovalCommand, Retention, RetentionScheme, RotateError,
    TimestampPattern,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// File name looked up in the default configuration directories
pub const CONFIG_FILE_NAME: &str = "rotate-backups.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file! ({}): {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid {field} for location {location}: {source}")]
    Invalid {
        location: String,
        field: &'static str,
        #[source]
        source: RotateError,
    },

    #[error("Invalid location pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    location: Vec<LocationSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct LocationSection {
    path: String,
    minutely: Option<RetentionValue>,
    hourly: Option<RetentionValue>,
    daily: Option<RetentionValue>,
    weekly: Option<RetentionValue>,
    monthly: Option<RetentionValue>,
    yearly: Option<RetentionValue>,
    include_list: Option<Vec<String>>,
    exclude_list: Option<Vec<String>>,
    ionice: Option<String>,
    strict: Option<bool>,
    prefer_recent: Option<bool>,
    recursive: Option<bool>,
    stat_timestamp: Option<bool>,
    use_sudo: Option<bool>,
    ssh_user: Option<String>,
    removal_command: Option<Vec<String>>,
    timestamp_pattern: Option<String>,
}

/// `daily = 7`, `daily = "7 * 2"` or `yearly = "always"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RetentionValue {
    Count(i64),
    Text(String),
}

impl RetentionValue {
    fn to_retention(&self) -> std::result::Result<Retention, RotateError> {
        match self {
            RetentionValue::Count(count) => Retention::from_count(*count),
            RetentionValue::Text(text) => text.parse(),
        }
    }
}

/// Options a configuration section sets for its location
///
/// `None` leaves the command line value in place.
#[derive(Debug, Clone, Default)]
pub struct LocationOverrides {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub io_class: Option<IoSchedulingClass>,
    pub strict: Option<bool>,
    pub prefer_recent: Option<bool>,
    pub recursive: Option<bool>,
    pub stat_timestamp: Option<bool>,
    pub removal_command: Option<RemovalCommand>,
    pub timestamp_pattern: Option<TimestampPattern>,
}

/// One `[[location]]` section, validated
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    /// Location with the section's `use-sudo` and `ssh-user` applied
    pub location: Location,
    pub scheme: RetentionScheme,
    pub overrides: LocationOverrides,
    /// File the section was loaded from
    pub source: PathBuf,
    glob: Option<Gitignore>,
}

impl ConfiguredLocation {
    fn from_section(section: LocationSection, source: &Path) -> Result<Self> {
        let location = Location::parse(&section.path)
            .with_sudo(section.use_sudo.unwrap_or(false))
            .with_ssh_user(section.ssh_user.clone());
        let name = location.to_string();
        let invalid = |field: &'static str| {
            let location = name.clone();
            move |source: RotateError| ConfigError::Invalid {
                location,
                field,
                source,
            }
        };

        let mut scheme = RetentionScheme::new();
        for (frequency, value) in [
            (Frequency::Minutely, &section.minutely),
            (Frequency::Hourly, &section.hourly),
            (Frequency::Daily, &section.daily),
            (Frequency::Weekly, &section.weekly),
            (Frequency::Monthly, &section.monthly),
            (Frequency::Yearly, &section.yearly),
        ] {
            if let Some(value) = value {
                let retention = value.to_retention().map_err(invalid(frequency.name()))?;
                scheme.set(frequency, retention);
            }
        }

        let io_class = section
            .ionice
            .as_deref()
            .map(str::parse::<IoSchedulingClass>)
            .transpose()
            .map_err(invalid("ionice"))?;
        let removal_command = section
            .removal_command
            .as_ref()
            .map(RemovalCommand::new)
            .transpose()
            .map_err(invalid("removal-command"))?;
        let timestamp_pattern = section
            .timestamp_pattern
            .as_deref()
            .map(TimestampPattern::new)
            .transpose()
            .map_err(invalid("timestamp-pattern"))?;

        let glob = if is_glob(location.directory()) {
            Some(build_glob(location.directory())?)
        } else {
            None
        };

        Ok(Self {
            location,
            scheme,
            overrides: LocationOverrides {
                include: section.include_list,
                exclude: section.exclude_list,
                io_class,
                strict: section.strict,
                prefer_recent: section.prefer_recent,
                recursive: section.recursive,
                stat_timestamp: section.stat_timestamp,
                removal_command,
                timestamp_pattern,
            },
            source: source.to_path_buf(),
            glob,
        })
    }

    pub fn is_glob(&self) -> bool {
        self.glob.is_some()
    }

    /// Whether this section configures `location`
    pub fn matches(&self, location: &Location) -> bool {
        if self.location == *location {
            return true;
        }
        match &self.glob {
            Some(glob) => {
                self.location.context().ssh_alias() == location.context().ssh_alias()
                    && glob
                        .matched(normalize(location.directory()), true)
                        .is_ignore()
            }
            None => false,
        }
    }

    /// Concrete locations of this section
    ///
    /// Local globs expand to the directories they match; everything else is
    /// returned as is.
    pub fn expand(&self) -> Vec<Location> {
        let Some(glob) = &self.glob else {
            return vec![self.location.clone()];
        };
        if self.location.is_remote() {
            return vec![self.location.clone()];
        }

        let pattern = normalize(self.location.directory());
        let (base, depth) = glob_base(&pattern);
        let mut matches = Vec::new();

        for entry in WalkDir::new(&base)
            .min_depth(depth)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if entry.file_type().is_dir() && glob.matched(entry.path(), true).is_ignore() {
                let directory = entry.path().to_string_lossy().into_owned();
                matches.push(Location::new(self.location.context().clone(), directory));
            }
        }

        debug!("Expanded {} to {} location(s)", pattern, matches.len());
        matches
    }
}

/// All loaded configuration sections, in precedence order
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: Vec<ConfiguredLocation>,
}

impl Config {
    /// Default configuration files, highest precedence first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(CONFIG_FILE_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", CONFIG_FILE_NAME)));
        }
        paths.push(PathBuf::from("/etc").join(CONFIG_FILE_NAME));
        paths
    }

    /// Load an explicit file, or every existing default file
    ///
    /// An explicit file that can't be read is an error; missing default
    /// files are skipped.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Using custom configuration file: {}", path.display());
            return Self::load_file(path);
        }

        let mut config = Config::default();
        for path in Self::default_paths() {
            if path.is_file() {
                debug!("Using configuration file {}", path.display());
                config.sections.extend(Self::load_file(&path)?.sections);
            }
        }
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    pub fn from_toml(text: &str, source: &Path) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text).map_err(|source_err| ConfigError::Parse {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let sections = file
            .location
            .into_iter()
            .map(|section| ConfiguredLocation::from_section(section, source))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[ConfiguredLocation] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// First section that configures `location`
    pub fn find(&self, location: &Location) -> Option<&ConfiguredLocation> {
        self.sections.iter().find(|section| section.matches(location))
    }

    /// Every configured location, globs expanded, without duplicates
    pub fn locations(&self) -> Vec<Location> {
        let mut locations: Vec<Location> = Vec::new();
        for section in &self.sections {
            for location in section.expand() {
                if !locations.contains(&location) {
                    locations.push(location);
                }
            }
        }
        locations
    }
}

fn is_glob(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

fn build_glob(pattern: &str) -> Result<Gitignore> {
    let pattern = normalize(pattern);
    let mut builder = GitignoreBuilder::new("/");
    builder
        .add_line(None, &pattern)
        .map_err(|source| ConfigError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
    builder.build().map_err(|source| ConfigError::Pattern {
        pattern: pattern.clone(),
        source,
    })
}

/// Directory to start expanding from and the depth of the matches below it
fn glob_base(pattern: &str) -> (PathBuf, usize) {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components
        .iter()
        .position(|component| is_glob(component))
        .unwrap_or(components.len());

    let base = components[..literal].join("/");
    let base = if base.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(base)
    };
    (base, components.len() - literal)
}
