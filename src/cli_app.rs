//! Top-level CLI definition and startup sequence.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use colored::control;
use thiserror::Error;

use svcmon::bus::ControlBus;
use svcmon::bus::busctl::BusctlBus;
use svcmon::bus::fetcher::BusStateFetcher;
use svcmon::bus::pool::FetchPool;
use svcmon::core::config::Config;
use svcmon::core::errors::SvcError;
use svcmon::core::units::Unit;
use svcmon::dashboard::event_loop::{Dashboard, LoopOptions};
use svcmon::dashboard::resize::ResizeFlag;
use svcmon::dashboard::terminal::{CrosstermSurface, TerminalGuard};
use svcmon::dashboard::theme::{ColorMode, Theme};
use svcmon::dashboard::viewport::Viewport;
use svcmon::logger::activity::ActivityLog;

/// svcmon: live status of systemd service units in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "svcmon",
    author,
    version,
    about = "Terminal dashboard for systemd service units",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Short service names to monitor; `.service` is appended to each.
    #[arg(required = true, num_args = 1.., value_name = "UNIT")]
    units: Vec<String>,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Refresh interval in milliseconds.
    #[arg(long, value_name = "MS")]
    refresh_ms: Option<u64>,
    /// Number of concurrent fetch workers (1 = sequential).
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
    /// Per-query bus timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
    /// Monitor the user service manager instead of the system one.
    #[arg(long)]
    user: bool,
}

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad arguments or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure (bus unreachable, terminal unusable).
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) => 2,
            Self::Internal(_) => 3,
        }
    }
}

impl From<SvcError> for CliError {
    fn from(err: SvcError) -> Self {
        match err {
            SvcError::InvalidConfig { .. }
            | SvcError::MissingConfig { .. }
            | SvcError::ConfigParse { .. } => Self::User(err.to_string()),
            SvcError::Serialization { .. }
            | SvcError::ChannelClosed { .. }
            | SvcError::Runtime { .. } => Self::Internal(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Load config, check the bus, then own the terminal until the user quits.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    let config = effective_config(cli)?;
    let units = monitored_units(cli, &config)?;

    let bus = BusctlBus::from_config(&config.bus);
    bus.ping()?;

    let log = ActivityLog::from_config(&config);
    log.config_loaded(&config.paths.config_file);
    log.dashboard_started(units.len(), &config.stable_hash()?);

    let started = Instant::now();
    let outcome = run_dashboard(cli, &config, units, Arc::new(bus), &log);
    match &outcome {
        Ok(()) => log.dashboard_stopped("quit", started.elapsed()),
        Err(err) => {
            log.error(err);
            log.dashboard_stopped("error", started.elapsed());
        }
    }
    outcome.map_err(CliError::from)
}

/// The guard lives only inside this function so the terminal is restored
/// before any error reaches stderr.
fn run_dashboard(
    cli: &Cli,
    config: &Config,
    units: Vec<Unit>,
    bus: Arc<dyn ControlBus>,
    log: &ActivityLog,
) -> svcmon::core::errors::Result<()> {
    let resize = ResizeFlag::with_signal();
    let theme = Theme::new(ColorMode::resolve(cli.no_color));

    let _guard = TerminalGuard::new()?;
    let surface = CrosstermSurface::new(theme, resize.clone());
    let viewport = Viewport::new(surface, config.dashboard.buffer_rows)?;
    let pool = FetchPool::new(BusStateFetcher::new(bus), config.bus.fetch_workers);

    let mut dashboard = Dashboard::new(
        viewport,
        units.into(),
        pool,
        resize,
        log.clone(),
        LoopOptions::from(&config.dashboard),
    );
    dashboard.run()
}

/// Config file + environment, then command-line overrides, validated once more.
fn effective_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(cli, &mut config);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(ms) = cli.refresh_ms {
        config.dashboard.refresh_interval_ms = ms;
    }
    if let Some(workers) = cli.workers {
        config.bus.fetch_workers = workers;
    }
    if let Some(ms) = cli.timeout_ms {
        config.bus.query_timeout_ms = ms;
    }
    if cli.user {
        config.bus.user_scope = true;
    }
}

fn monitored_units(cli: &Cli, config: &Config) -> Result<Vec<Unit>, CliError> {
    if let Some(bad) = cli
        .units
        .iter()
        .find(|name| name.trim().is_empty() || name.chars().any(char::is_whitespace))
    {
        return Err(CliError::User(format!("invalid unit name {bad:?}")));
    }
    Ok(Unit::from_names(
        cli.units.iter().cloned(),
        &config.bus.service_suffix,
    ))
}

// ──────────────────── tests ────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn units_are_required() {
        assert!(Cli::try_parse_from(["svcmon"]).is_err());
        assert!(Cli::try_parse_from(["svcmon", "--no-color"]).is_err());
    }

    #[test]
    fn units_keep_argument_order() {
        let cli = parse(&["svcmon", "nginx", "sshd", "cron"]);
        let units = monitored_units(&cli, &Config::default()).unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.query_name.as_str()).collect();
        assert_eq!(names, ["nginx.service", "sshd.service", "cron.service"]);
    }

    #[test]
    fn blank_unit_name_is_a_user_error() {
        let cli = parse(&["svcmon", "nginx", " "]);
        let err = monitored_units(&cli, &Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "svcmon",
            "--refresh-ms",
            "250",
            "--workers",
            "1",
            "--timeout-ms",
            "500",
            "--user",
            "nginx",
        ]);
        let mut config = Config::default();
        apply_overrides(&cli, &mut config);

        assert_eq!(config.dashboard.refresh_interval_ms, 250);
        assert_eq!(config.bus.fetch_workers, 1);
        assert_eq!(config.bus.query_timeout_ms, 500);
        assert!(config.bus.user_scope);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_override_fails_validation() {
        let cli = parse(&["svcmon", "--workers", "0", "nginx"]);
        let mut config = Config::default();
        apply_overrides(&cli, &mut config);
        let err = CliError::from(config.validate().unwrap_err());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn error_classes_map_to_exit_codes() {
        let bus = CliError::from(SvcError::BusConnect {
            details: "no bus".to_string(),
        });
        assert_eq!(bus.exit_code(), 2);

        let terminal = CliError::from(SvcError::terminal(
            "enable raw mode",
            std::io::Error::other("not a tty"),
        ));
        assert_eq!(terminal.exit_code(), 2);

        let missing = CliError::from(SvcError::MissingConfig {
            path: PathBuf::from("/nope.toml"),
        });
        assert_eq!(missing.exit_code(), 1);

        let internal = CliError::from(SvcError::ChannelClosed {
            component: "fetch pool",
        });
        assert_eq!(internal.exit_code(), 3);
    }
}
