//! Listwell Maintenance
//!
//! Scheduled job that keeps the listing catalogue alive: tops up open
//! inventory, paces intros, closes full listings and simulates activity.
//!
//! # Usage
//!
//! ```bash
//! # One cycle, for cron or a systemd timer
//! listwell-maintenance run
//!
//! # Loop until Ctrl+C / SIGTERM
//! listwell-maintenance watch --interval-secs 600
//!
//! # Lifecycle counts
//! listwell-maintenance --json census
//!
//! # Environment overrides
//! LISTWELL__ENGINE__TOPUP__MIN_OPEN=80 listwell-maintenance run
//! ```

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use listwell_engine::MaintenanceOrchestrator;
use listwell_store::{ListingStore, SqliteListingStore};
use listwell_types::CycleReport;

use crate::config::MaintenanceConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Listwell Maintenance - listing lifecycle and pacing job
#[derive(Parser, Debug)]
#[command(name = "listwell-maintenance")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, global = true, env = "LISTWELL_CONFIG")]
    config: Option<String>,

    /// SQLite connection URL
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Floor on the number of open listings
    #[arg(long, global = true)]
    min_open: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LISTWELL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, global = true, env = "LISTWELL_LOG_FORMAT")]
    log_format: Option<String>,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Seed every random draw for a reproducible run
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Run one maintenance cycle and exit
    Run,

    /// Run a maintenance cycle on a fixed interval until shutdown
    Watch {
        /// Seconds between cycles
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Print listing counts by lifecycle bucket
    Census,
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = MaintenanceConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.engine.validate()?;

    init_logging(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        command = ?args.command,
        "Starting Listwell maintenance"
    );

    let store = SqliteListingStore::connect(&config.store)
        .await
        .with_context(|| format!("failed to open listing store at {}", config.store.database_url))?;
    let store: Arc<dyn ListingStore> = Arc::new(store);

    match args.command {
        Command::Run => {
            let mut orchestrator = build_orchestrator(&config, store)?;
            let report = orchestrator.run_cycle().await;
            print_report(&report, args.json)?;
        }
        Command::Watch { .. } => {
            let orchestrator = build_orchestrator(&config, store)?;
            watch(orchestrator, config.schedule.interval(), args.json).await?;
        }
        Command::Census => {
            let now = Utc::now();
            let census = store.census(now).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&census)?);
            } else {
                println!(
                    "open={} closed_visible={} closed_expired={} administrative={} total={}",
                    census.open,
                    census.closed_visible,
                    census.closed_expired,
                    census.administrative,
                    census.total()
                );
            }
        }
    }

    tracing::info!("Maintenance shutdown complete");
    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// CLI flags win over files and environment
fn apply_overrides(config: &mut MaintenanceConfig, args: &Args) {
    if let Some(url) = &args.database_url {
        config.store.database_url = url.clone();
    }
    if let Some(min_open) = args.min_open {
        config.engine.topup.min_open = min_open;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.logging.format = format.clone();
    }
    if args.seed.is_some() {
        config.schedule.seed = args.seed;
    }
    if let Command::Watch {
        interval_secs: Some(secs),
    } = args.command
    {
        config.schedule.interval_secs = secs;
    }
}

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

fn build_orchestrator(
    config: &MaintenanceConfig,
    store: Arc<dyn ListingStore>,
) -> anyhow::Result<MaintenanceOrchestrator> {
    let mut builder = MaintenanceOrchestrator::builder(store).with_config(config.engine.clone());
    if let Some(seed) = config.schedule.seed {
        builder = builder.with_seed(seed);
    }
    Ok(builder.build()?)
}

fn print_report(report: &CycleReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!("{}", report_line(report));
    }
    Ok(())
}

fn report_line(report: &CycleReport) -> String {
    format!(
        "cycle={} created={} admitted={} closed={} views_bumped={} failures={} elapsed_ms={}",
        report.cycle_id,
        report.created,
        report.admitted,
        report.closed,
        report.views_bumped,
        report.failures,
        report.elapsed_ms
    )
}

// =============================================================================
// Watch Loop
// =============================================================================

async fn watch(
    mut orchestrator: MaintenanceOrchestrator,
    period: Duration,
    json: bool,
) -> anyhow::Result<()> {
    tracing::info!(interval_secs = period.as_secs(), "Watching listing lifecycle");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = orchestrator.run_cycle().await;
                print_report(&report, json)?;
            }
            _ = &mut shutdown => break,
        }
    }

    Ok(())
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, stopping after the current cycle");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, stopping after the current cycle");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["listwell-maintenance", "--min-open", "12", "run"]);
        assert_eq!(args.min_open, Some(12));
        assert_eq!(args.command, Command::Run);

        let args = Args::parse_from([
            "listwell-maintenance",
            "watch",
            "--interval-secs",
            "30",
            "--json",
        ]);
        assert!(args.json);
        assert_eq!(
            args.command,
            Command::Watch {
                interval_secs: Some(30)
            }
        );
    }

    #[test]
    fn test_overrides_win_over_loaded_config() {
        let args = Args::parse_from([
            "listwell-maintenance",
            "--database-url",
            "sqlite::memory:",
            "--min-open",
            "7",
            "--seed",
            "99",
            "--log-format",
            "json",
            "watch",
            "--interval-secs",
            "45",
        ]);
        let mut config = MaintenanceConfig::development();
        apply_overrides(&mut config, &args);

        assert_eq!(config.store.database_url, "sqlite::memory:");
        assert_eq!(config.engine.topup.min_open, 7);
        assert_eq!(config.schedule.seed, Some(99));
        assert_eq!(config.schedule.interval_secs, 45);
        assert_eq!(config.logging.format, "json");
    }

    #[tokio::test]
    async fn test_single_run_against_in_memory_store() {
        let mut config = MaintenanceConfig::development();
        config.store = listwell_store::StoreConfig::in_memory();
        config.engine.topup.min_open = 6;

        let store = SqliteListingStore::connect(&config.store).await.unwrap();
        let store: Arc<dyn ListingStore> = Arc::new(store);
        let mut orchestrator = build_orchestrator(&config, store.clone()).unwrap();

        let report = orchestrator.run_cycle().await;
        assert_eq!(report.created, 6);
        assert_eq!(report.failures, 0);
        assert_eq!(store.census(Utc::now()).await.unwrap().open, 6);
    }

    #[test]
    fn test_report_line_lists_every_count() {
        let mut report = CycleReport::new(listwell_types::CycleId::new(), Utc::now());
        report.created = 2;
        report.admitted = 1;
        report.views_bumped = 15;

        let line = report_line(&report);
        assert!(line.starts_with(&format!("cycle={} ", report.cycle_id)));
        assert!(line.contains(" created=2 admitted=1 closed=0 views_bumped=15 failures=0 "));
        assert!(line.ends_with(" elapsed_ms=0"));
    }
}
