use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use onsleep_daemon::cli::{apply_settings, Cli};
use onsleep_daemon::config::ConfigStore;
use onsleep_daemon::controller::{Controller, ControllerParams};
use onsleep_daemon::errors::ConfigError;
use onsleep_daemon::host::install::DEFAULT_UNIT_DIR;
use onsleep_daemon::host::power::PowerPaths;
use onsleep_daemon::host::{PowerSource, SystemdDirectory, SystemdTriggerRunner, UnitInstaller};
use onsleep_daemon::sequencer::StopPolicy;
use onsleep_daemon::service::ServiceDirectory;
use onsleep_daemon::shutdown::ShutdownSignal;
use onsleep_daemon::transition_log::TracingLog;
use onsleep_daemon::SERVICE_NAME;
use onsleep_unix::process::running_as_root;
use onsleep_unix::systemctl::Systemctl;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = ConfigStore::resolve(cli.config.clone());

    if cli.runs_service() {
        return run_service(store).await;
    }

    apply_settings(&cli, &store, &mut std::io::stdout().lock())?;

    if cli.install || cli.uninstall {
        let exec_path = std::env::current_exe()?;
        let installer = UnitInstaller::new(
            Systemctl::new(),
            DEFAULT_UNIT_DIR,
            exec_path,
            store.path(),
        );
        if cli.install {
            installer.install()?;
        }
        if cli.uninstall {
            installer.uninstall()?;
        }
    }

    Ok(())
}

async fn run_service(store: ConfigStore) -> Result<()> {
    info!("Starting {} service", SERVICE_NAME);

    if !running_as_root() {
        warn!("Not running as root, service control requests will likely be denied");
    }

    let directory = Arc::new(SystemdDirectory::new(Systemctl::new()));
    directory.ping().map_err(ConfigError::DirectoryUnavailable)?;

    let config = store.load()?;
    info!(
        "Loaded {}: anchor {}, OnSleep={}, OnWake={}",
        store.path().display(),
        config.anchor(),
        config.on_sleep.as_deref().unwrap_or("UNSET"),
        config.on_wake.as_deref().unwrap_or("UNSET"),
    );

    let shutdown = ShutdownSignal::new();
    let controller = Arc::new(Controller::new(ControllerParams {
        directory,
        triggers: Arc::new(SystemdTriggerRunner::new(Systemctl::new())),
        log: Arc::new(TracingLog),
        hooks: config.hooks(),
        anchor: config.anchor(),
        policy: StopPolicy::default(),
        shutdown: shutdown.clone(),
    }));

    let source = PowerSource::new(PowerPaths::default(), config.poll_interval())
        .spawn(controller.clone());

    wait_for_termination().await;
    info!("Shutdown requested");

    shutdown.trigger();
    source.shutdown().await;

    info!("{} stopped in phase {}", SERVICE_NAME, controller.phase());
    Ok(())
}

async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
