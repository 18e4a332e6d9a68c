mod output;

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};

use reclaim_cleaner::{ConfigError, ReclaimConfig, RunReport, RunStatus, SpaceReclaimer};

use crate::output::{OutputFormat, Printer};

/// Delete the oldest files in one or more directories until enough disk
/// space is available.
///
/// If the requested space is already available nothing is deleted.
/// Otherwise all regular files below the given directories are collected
/// and removed oldest first (by modification time) until the space is
/// available or no files are left. Directories are never deleted, and all
/// directories must live on the same device.
#[derive(Parser, Debug)]
#[command(name = "reclaim-cleanup", version, about)]
struct Cli {
    /// Directory to clean up. May be given more than once.
    #[arg(short = 'd', long = "directory", value_name = "DIRECTORY")]
    directories: Vec<PathBuf>,

    /// More directories to clean up.
    #[arg(value_name = "DIR")]
    extra_directories: Vec<PathBuf>,

    /// Space in megabytes that should be available afterwards [default: 51200].
    #[arg(short = 's', long = "min-free-mb", value_name = "MIN_AVAIL_SPACE")]
    min_free_mb: Option<u64>,

    /// Re-run every N seconds instead of once.
    #[arg(long, value_name = "SECONDS")]
    interval_secs: Option<u64>,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Dump default configuration and exit.
    #[arg(long)]
    dump_default_config: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<ReclaimConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ReclaimConfig::load(path)?,
            None => ReclaimConfig::default(),
        };

        let dirs: Vec<PathBuf> = self
            .directories
            .iter()
            .chain(&self.extra_directories)
            .cloned()
            .collect();
        if !dirs.is_empty() {
            config.directories = dirs;
        }
        if let Some(mb) = self.min_free_mb {
            config.min_free_mb = mb;
        }
        if let Some(secs) = self.interval_secs {
            config.interval_secs = secs;
        }
        if self.verbose {
            config.log.level = "debug".into();
        }

        config.validate()?;
        Ok(config)
    }
}

const EXIT_UNMET: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn exit_status(status: RunStatus) -> u8 {
    if status.is_success() {
        0
    } else {
        EXIT_UNMET
    }
}

fn run_once<W: Write>(
    config: &ReclaimConfig,
    printer: &mut Printer<W>,
) -> anyhow::Result<RunStatus> {
    let targets = config.targets()?;
    let report: RunReport = SpaceReclaimer::default().reclaim(&targets, config.threshold());
    printer.print_report(&report)?;
    Ok(report.status)
}

/// Resolves on the first SIGINT or SIGTERM.
///
/// Both handlers are installed before this returns, so a signal that
/// arrives while a pass is running is kept until the future is polled.
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => tracing::info!("Received CTRL+C"),
            _ = terminate.recv() => tracing::info!("Received SIGTERM"),
        }
    })
}

/// Run a pass every `interval` until `shutdown` resolves, returning the
/// status of the last completed pass.
async fn run_periodic<W, F>(
    config: ReclaimConfig,
    interval: Duration,
    printer: &mut Printer<W>,
    shutdown: F,
) -> anyhow::Result<RunStatus>
where
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    let mut last = RunStatus::TargetAlreadyMet;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                tracing::info!("Stopping periodic reclaim");
                return Ok(last);
            }
            _ = ticker.tick() => {
                let pass_config = config.clone();
                let report = tokio::task::spawn_blocking(move || -> anyhow::Result<RunReport> {
                    let targets = pass_config.targets()?;
                    Ok(SpaceReclaimer::default().reclaim(&targets, pass_config.threshold()))
                })
                .await??;

                printer.print_report(&report)?;
                tracing::info!(
                    status = %report.status,
                    reclaimed = report.reclaimed_bytes,
                    next_in_secs = interval.as_secs(),
                    "Reclaim pass completed"
                );
                last = report.status;
            }
        }
    }
}

/// Config resolution with the context `main` reports on failure.
fn load_config(cli: &Cli) -> anyhow::Result<ReclaimConfig> {
    cli.resolve_config().context("failed to load reclaim configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if cli.dump_default_config {
        print!("{}", toml::to_string_pretty(&ReclaimConfig::default())?);
        return Ok(ExitCode::SUCCESS);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    let _guard = reclaim_logging::init_logging(&config.log)?;

    tracing::info!(
        directories = ?config.directories,
        min_free_mb = config.min_free_mb,
        "Starting reclaim"
    );

    let mut printer = Printer::stdout(cli.format);
    let status = match config.interval() {
        Some(interval) => {
            let shutdown = shutdown_signal()?;
            run_periodic(config, interval, &mut printer, shutdown).await?
        }
        None => run_once(&config, &mut printer)?,
    };

    Ok(ExitCode::from(exit_status(status)))
}
