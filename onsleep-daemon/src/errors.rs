use std::path::PathBuf;
use thiserror::Error;

use crate::controller::TransitionPhase;
use crate::service::ServiceName;

/// Failures talking to the service directory (open, query, control).
///
/// Always logged by the sequencer; a single service's failure never aborts
/// the loop over the rest of the set.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Service not found: {0}")]
    NotFound(ServiceName),

    #[error("Unable to query service {service} (code {code})")]
    QueryFailed { service: ServiceName, code: i32 },

    #[error("Unable to enumerate dependents of {anchor} (code {code})")]
    EnumerateFailed { anchor: ServiceName, code: i32 },

    #[error("Unable to {action} service {service} (code {code}): {message}")]
    ControlFailed {
        service: ServiceName,
        action: &'static str,
        code: i32,
        message: String,
    },

    #[error("Service directory unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to invoke service manager: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    /// Last error code carried by the failure, for log entries
    pub fn code(&self) -> Option<i32> {
        match self {
            AdapterError::QueryFailed { code, .. }
            | AdapterError::EnumerateFailed { code, .. }
            | AdapterError::ControlFailed { code, .. } => Some(*code),
            AdapterError::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

/// External hook invocation failed. Logged, never fatal to a transition.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Trigger {trigger} failed: {reason}")]
    Failed { trigger: String, reason: String },

    #[error("Failed to invoke trigger {trigger}: {source}")]
    Io {
        trigger: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal start-up and configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Service directory root unavailable: {0}")]
    DirectoryUnavailable(#[source] AdapterError),

    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write config file '{path}': {message}")]
    Write { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Errors surfaced by the transition controller itself.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Illegal phase transition {from} -> {to}")]
    IllegalTransition {
        from: TransitionPhase,
        to: TransitionPhase,
    },

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

/// Errors from the command-line surface (install, uninstall, settings).
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write unit file {path}: {source}")]
    UnitWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove unit file {path}: {source}")]
    UnitRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("systemctl {command} failed (code {code}): {message}")]
    Systemctl {
        command: String,
        code: i32,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
