//! PTZ Bridge - host process
//!
//! Loads the config, runs control cycles on a fixed tick and feeds them from
//! the interactive parameter panel.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ptz_bridge::bridge::{Bridge, Selection, SharedBridge};
use ptz_bridge::cli::{self, HostCommand};
use ptz_bridge::config::{AppConfig, ConfigWatcher};
use ptz_bridge::discovery::StaticDiscovery;
use ptz_bridge::panel::{ParameterPanel, Pulse};
use ptz_bridge::paths::AppPaths;

/// PTZ Bridge - drive a network PTZ camera from control parameters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the detected app config)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Also write a daily log file into the logs directory
    #[arg(long, env = "LOG_TO_FILE")]
    log_file: bool,

    /// Refresh sources once, print them and exit
    #[arg(long)]
    list_sources: bool,

    /// Initial source selection (index, #index or address)
    #[arg(long)]
    select: Option<String>,

    /// Run without the interactive prompt
    #[arg(long)]
    no_repl: bool,
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let paths = AppPaths::detect();

    paths.ensure_directories()?;
    let log_dir = args.log_file.then_some(paths.logs_dir.as_path());
    let _log_guard = init_logging(&args.log_level, log_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| paths.config.to_string_lossy().to_string());

    info!("Starting PTZ Bridge v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", config_path);

    let (config_watcher, initial_config) = ConfigWatcher::new(config_path).await?;
    let config = (*initial_config).clone();
    info!(
        "Receiver '{}' using {:?} transport, {} configured source(s)",
        config.bridge.receiver_name,
        config.transport.kind,
        config.sources.len()
    );

    let discovery = StaticDiscovery::new(config.resolved_sources().await);
    let bridge = SharedBridge::new(Bridge::new(
        Box::new(discovery.clone()),
        config.transport.build(),
        config.bridge_settings(),
    ));

    refresh_sources(&bridge).await;

    if args.list_sources {
        bridge.with(|b| cli::print_sources(b.menu(), &b.state()));
        bridge.shutdown();
        return Ok(());
    }

    let mut panel = ParameterPanel::new();
    panel.select(args.select.as_deref().unwrap_or(&config.bridge.initial_selection));

    let (tx, rx) = mpsc::channel(32);
    let _idle_tx = if args.no_repl {
        Some(tx)
    } else {
        std::thread::Builder::new()
            .name("repl".to_string())
            .spawn(move || {
                if let Err(e) = cli::run_repl(tx) {
                    warn!("REPL stopped: {}", e);
                }
            })
            .context("Failed to start REPL thread")?;
        None
    };

    run_app(bridge.clone(), panel, config, discovery, config_watcher, rx).await;

    bridge.shutdown();
    info!("PTZ Bridge shutdown complete");
    Ok(())
}

async fn run_app(
    bridge: SharedBridge,
    mut panel: ParameterPanel,
    mut config: AppConfig,
    discovery: StaticDiscovery,
    mut config_watcher: ConfigWatcher,
    mut commands: mpsc::Receiver<HostCommand>,
) {
    info!("Starting control loop ({} ms per cycle)", config.bridge.cycle_interval_ms);

    let mut ticker = new_ticker(config.cycle_interval());
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(&bridge, &panel).await;
            }

            Some(command) = commands.recv() => {
                if let Flow::Quit = handle_command(command, &bridge, &mut panel).await {
                    info!("Quit requested");
                    break;
                }
            }

            Some(new_config) = config_watcher.next_config() => {
                discovery.replace(new_config.resolved_sources().await);
                info!("Advertised sources updated, run 'refresh' to rebuild the menu");

                if new_config.bridge.cycle_interval_ms != config.bridge.cycle_interval_ms {
                    info!("Cycle interval changed to {} ms", new_config.bridge.cycle_interval_ms);
                    ticker = new_ticker(new_config.cycle_interval());
                }
                if new_config.transport.kind != config.transport.kind
                    || new_config.transport.visca != config.transport.visca
                {
                    warn!("Transport settings changed; restart to apply them");
                }
                config = new_config;
            }

            _ = &mut shutdown => {
                break;
            }
        }
    }
}

fn new_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// One cycle on the blocking pool; the caller awaits it so cycles never overlap
async fn run_cycle(bridge: &SharedBridge, panel: &ParameterPanel) {
    let snapshot = panel.snapshot();
    let bridge = bridge.clone();
    match tokio::task::spawn_blocking(move || bridge.run_cycle(&snapshot)).await {
        Ok(output) => {
            if let Ok(Selection::Connected(_)) = &output.selection {
                debug!("Cycle {}: {}", output.cycle, output.state);
            }
            if !output.dispatch.is_idle() {
                debug!(
                    "Cycle {}: {} sent, {} failed",
                    output.cycle,
                    output.dispatch.sent.len(),
                    output.dispatch.failed.len()
                );
            }
        },
        Err(e) => warn!("Cycle task failed: {}", e),
    }
}

async fn refresh_sources(bridge: &SharedBridge) {
    let bridge = bridge.clone();
    match tokio::task::spawn_blocking(move || bridge.refresh_sources()).await {
        Ok(Ok(count)) => debug!("Discovered {} source(s)", count),
        Ok(Err(e)) => debug!("Source refresh: {}", e),
        Err(e) => warn!("Refresh task failed: {}", e),
    }
}

async fn handle_command(
    command: HostCommand,
    bridge: &SharedBridge,
    panel: &mut ParameterPanel,
) -> Flow {
    use colored::Colorize;

    match command {
        HostCommand::Set { name, value } => {
            if let Err(e) = panel.apply(&name, &value) {
                println!("{}", e.to_string().yellow());
            }
        },
        HostCommand::Select(selection) => panel.select(&selection),
        HostCommand::Pulse(Pulse::Reset) => {
            bridge.with(|b| b.diagnostics_mut().reset());
        },
        HostCommand::Pulse(Pulse::UpdateSources) => {
            refresh_sources(bridge).await;
            bridge.with(|b| cli::print_sources(b.menu(), &b.state()));
        },
        HostCommand::Offset(offset) => {
            bridge.with(|b| b.diagnostics_mut().set_offset(offset));
        },
        HostCommand::Sources => bridge.with(|b| cli::print_sources(b.menu(), &b.state())),
        HostCommand::State => bridge.with(|b| cli::print_state(&b.state(), b.camera_state())),
        HostCommand::Info => bridge.with(|b| cli::print_diagnostics(&b.diagnostics().table())),
        HostCommand::Params => cli::print_params(panel),
        HostCommand::Help => cli::print_help(),
        HostCommand::Quit => return Flow::Quit,
    }

    Flow::Continue
}

/// Console logging, plus a daily rolling file when `log_dir` is set
fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ptz-bridge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
