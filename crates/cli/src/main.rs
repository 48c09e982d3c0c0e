//! rotate-backups - backup rotation with flexible retention schemes

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use cli_lib::{logging, Config, RotateBackups, RotationSummary};
use location::{DeletionPool, Location};
use owo_colors::OwoColorize;
use rotate_core::{
    Frequency, IoSchedulingClass, RemovalCommand, Retention, RetentionScheme, RotationOptions,
    TimestampPattern,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

/// Rotate backups in one or more directories according to a retention scheme
///
/// A location is a local directory or SSH_ALIAS:DIRECTORY for a remote one.
/// COUNT is a number, an arithmetic expression or `always`. Frequencies that
/// aren't given keep nothing. Use --dry-run to preview the effect of a
/// scheme before letting it loose on your backups.
#[derive(Parser)]
#[command(name = "rotate-backups")]
#[command(author, version, about, long_about)]
struct Cli {
    /// Number of minutely backups to preserve
    #[arg(short = 'M', long, value_name = "COUNT")]
    minutely: Option<String>,

    /// Number of hourly backups to preserve
    #[arg(short = 'H', long, value_name = "COUNT")]
    hourly: Option<String>,

    /// Number of daily backups to preserve
    #[arg(short = 'd', long, value_name = "COUNT")]
    daily: Option<String>,

    /// Number of weekly backups to preserve
    #[arg(short = 'w', long, value_name = "COUNT")]
    weekly: Option<String>,

    /// Number of monthly backups to preserve
    #[arg(short = 'm', long, value_name = "COUNT")]
    monthly: Option<String>,

    /// Number of yearly backups to preserve
    #[arg(short = 'y', long, value_name = "COUNT")]
    yearly: Option<String>,

    /// Only process backups whose file name matches PATTERN (repeatable)
    #[arg(short = 'I', long = "include", value_name = "PATTERN")]
    include: Vec<String>,

    /// Skip backups whose file name matches PATTERN (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Delete backups concurrently, one at a time per disk
    #[arg(short = 'j', long)]
    parallel: bool,

    /// Keep the newest backup of each period instead of the oldest
    #[arg(short = 'p', long)]
    prefer_recent: bool,

    /// Don't enforce the time window of each frequency
    #[arg(short = 'r', long)]
    relaxed: bool,

    /// I/O scheduling class for removals (idle, best-effort or realtime)
    #[arg(short = 'i', long, value_name = "CLASS")]
    ionice: Option<String>,

    /// Configuration file (default: rotate-backups.toml in the usual places)
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command that removes a backup (default: rm -fR)
    #[arg(short = 'C', long, value_name = "CMD")]
    removal_command: Option<String>,

    /// Regular expression with year, month and day capture groups
    #[arg(long, value_name = "REGEX")]
    timestamp_pattern: Option<String>,

    /// Use file modification times instead of names
    #[arg(long)]
    stat_timestamp: bool,

    /// Run commands through sudo
    #[arg(short = 'u', long)]
    use_sudo: bool,

    /// Skip the writability check before deleting
    #[arg(short = 'f', long)]
    force: bool,

    /// Look for backup files in subdirectories
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Only show what would be deleted
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Increase logging verbosity (repeatable)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (repeatable)
    #[arg(short = 'q', long, action = ArgAction::Count)]
    quiet: u8,

    /// Also append log messages to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Directories to rotate (default: every configured location)
    #[arg(value_name = "LOCATION")]
    locations: Vec<String>,
}

impl Cli {
    fn scheme(&self) -> Result<RetentionScheme> {
        let mut scheme = RetentionScheme::new();
        for (frequency, value) in [
            (Frequency::Minutely, &self.minutely),
            (Frequency::Hourly, &self.hourly),
            (Frequency::Daily, &self.daily),
            (Frequency::Weekly, &self.weekly),
            (Frequency::Monthly, &self.monthly),
            (Frequency::Yearly, &self.yearly),
        ] {
            if let Some(value) = value {
                let retention: Retention = value.parse()?;
                scheme.set(frequency, retention);
            }
        }
        Ok(scheme)
    }

    fn options(&self) -> Result<RotationOptions> {
        let io_class = self
            .ionice
            .as_deref()
            .map(str::parse::<IoSchedulingClass>)
            .transpose()?;
        let removal_command = match &self.removal_command {
            Some(command_line) => RemovalCommand::parse(command_line)?,
            None => RemovalCommand::default(),
        };
        let timestamp_pattern = match &self.timestamp_pattern {
            Some(pattern) => TimestampPattern::new(pattern)?,
            None => TimestampPattern::default(),
        };

        Ok(RotationOptions {
            strict: !self.relaxed,
            prefer_recent: self.prefer_recent,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            stat_timestamp: self.stat_timestamp,
            timestamp_pattern,
            removal_command: removal_command.with_io_class(io_class),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = logging::level_filter(cli.verbose, cli.quiet);
    let _guard = match logging::init(level, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let scheme = cli.scheme()?;
    let options = cli.options()?;
    if !scheme.is_empty() {
        debug!("Parsed rotation scheme: {}", scheme);
    }
    if cli.dry_run {
        info!("Performing a dry run (because of --dry-run option)");
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let locations: Vec<Location> = if cli.locations.is_empty() {
        config.locations()
    } else {
        cli.locations
            .iter()
            .map(|value| Location::parse(value).with_sudo(cli.use_sudo))
            .collect()
    };

    if locations.is_empty() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let program = RotateBackups::new(scheme, options, config)
        .recursive(cli.recursive)
        .dry_run(cli.dry_run)
        .force(cli.force);

    let summaries = if cli.parallel {
        let pool = DeletionPool::default();
        program
            .rotate_concurrent(&locations, &pool, cli.quiet == 0)
            .await?
    } else {
        let mut summaries = Vec::with_capacity(locations.len());
        for location in &locations {
            summaries.push(program.rotate(location).await?);
        }
        summaries
    };

    if cli.quiet == 0 {
        for summary in &summaries {
            print_summary(summary);
        }
    }
    Ok(())
}

fn print_summary(summary: &RotationSummary) {
    let deleted = if summary.dry_run {
        "to delete"
    } else {
        "deleted"
    };
    println!(
        "{}: {} preserved, {} {}",
        summary.location.bold(),
        summary.preserved.green(),
        summary.deleted.red(),
        deleted
    );
}
