//! Command-line surface of the `onsleep` binary.
//!
//! With no action flag the binary runs as the service. Action flags may be
//! combined and are applied in a fixed order: hook updates, clear, print,
//! install, uninstall.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use crate::config::{ConfigStore, OnSleepConfig};
use crate::errors::CliError;
use crate::hooks::HookKind;

/// Printed by `--commands` for an unset hook
pub const UNSET: &str = "UNSET";

/// OnSleep - stop audio services on lid close, restart them on lid open
#[derive(Parser, Debug, Default)]
#[command(name = "onsleep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Install and enable the systemd unit
    #[arg(long)]
    pub install: bool,

    /// Stop, disable and remove the systemd unit
    #[arg(long)]
    pub uninstall: bool,

    /// Unit to start after services are stopped on sleep
    #[arg(long = "onsleep", value_name = "ID")]
    pub on_sleep: Option<String>,

    /// Unit to start before services are restarted on wake
    #[arg(long = "onwake", value_name = "ID")]
    pub on_wake: Option<String>,

    /// Clear both hooks
    #[arg(long = "nocommands")]
    pub no_commands: bool,

    /// Print the configured hooks
    #[arg(long)]
    pub commands: bool,

    /// Path to the configuration file
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// No action flag given: run the service loop
    pub fn runs_service(&self) -> bool {
        !(self.install
            || self.uninstall
            || self.on_sleep.is_some()
            || self.on_wake.is_some()
            || self.no_commands
            || self.commands)
    }

    fn updates_config(&self) -> bool {
        self.on_sleep.is_some() || self.on_wake.is_some() || self.no_commands
    }
}

/// Apply hook updates and `--nocommands`, then print with `--commands`.
///
/// The file is only written when a setting actually changes.
pub fn apply_settings(
    cli: &Cli,
    store: &ConfigStore,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let config = if cli.updates_config() {
        store.update(|config| {
            if let Some(id) = &cli.on_sleep {
                config.set_hook(HookKind::OnSleep, Some(id.clone()));
            }
            if let Some(id) = &cli.on_wake {
                config.set_hook(HookKind::OnWake, Some(id.clone()));
            }
            if cli.no_commands {
                config.clear_hooks();
            }
        })?
    } else if cli.commands {
        store.load()?
    } else {
        return Ok(());
    };

    if cli.commands {
        out.write_all(format_commands(&config).as_bytes())?;
    }
    Ok(())
}

/// `OnSleep=<v>` and `OnWake=<v>` lines, [`UNSET`] for an absent hook.
pub fn format_commands(config: &OnSleepConfig) -> String {
    [HookKind::OnSleep, HookKind::OnWake]
        .iter()
        .map(|kind| format!("{}={}\n", kind, config.hook(*kind).unwrap_or(UNSET)))
        .collect()
}
