pub mod cli;
pub mod config;
pub mod controller;
pub mod errors;
pub mod hooks;
pub mod host;
pub mod sequencer;
pub mod service;
pub mod shutdown;
pub mod transition_log;

/// Name under which the service is installed and logs
pub const SERVICE_NAME: &str = "onsleep";

/// systemd unit file name used by `--install` / `--uninstall`
pub const UNIT_NAME: &str = "onsleep.service";
