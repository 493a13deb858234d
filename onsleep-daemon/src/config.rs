//! YAML configuration store.
//!
//! ```yaml
//! OnSleep: suspend-tasks.service
//! OnWake: resume-tasks.service
//! Anchor: alsa-state.service
//! PollInterval: 1s
//! ```
//!
//! Every key is optional. An absent hook key disables that hook.

mod duration;

pub use duration::{format_duration, parse_duration};

use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::errors::ConfigError;
use crate::hooks::{HookConfig, HookKind};
use crate::service::ServiceName;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/onsleep/onsleep.yaml";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`]
pub const CONFIG_PATH_ENV: &str = "ONSLEEP_CONFIG";

/// The system audio state service
pub const DEFAULT_ANCHOR: &str = "alsa-state.service";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct OnSleepConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_sleep: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_wake: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "duration::deserialize_optional_duration",
        serialize_with = "duration::serialize_optional_duration"
    )]
    pub poll_interval: Option<Duration>,
}

impl OnSleepConfig {
    pub fn hooks(&self) -> HookConfig {
        HookConfig::new(self.on_sleep.clone(), self.on_wake.clone())
    }

    pub fn hook(&self, kind: HookKind) -> Option<&str> {
        match kind {
            HookKind::OnSleep => self.on_sleep.as_deref(),
            HookKind::OnWake => self.on_wake.as_deref(),
        }
    }

    /// Set or clear one hook slot. An empty id clears it.
    pub fn set_hook(&mut self, kind: HookKind, trigger: Option<String>) {
        let trigger = trigger.filter(|t| !t.trim().is_empty());
        match kind {
            HookKind::OnSleep => self.on_sleep = trigger,
            HookKind::OnWake => self.on_wake = trigger,
        }
    }

    pub fn clear_hooks(&mut self) {
        self.on_sleep = None;
        self.on_wake = None;
    }

    pub fn anchor(&self) -> ServiceName {
        ServiceName::new(self.anchor.as_deref().unwrap_or(DEFAULT_ANCHOR))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(anchor) = &self.anchor
            && anchor.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                key: "Anchor",
                message: "service name must not be empty".to_string(),
            });
        }
        if self.poll_interval.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::InvalidValue {
                key: "PollInterval",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Location of the configuration file plus load/save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `--config` wins over `ONSLEEP_CONFIG`, which wins over the default path.
    pub fn resolve(cli_path: Option<PathBuf>) -> Self {
        let path = cli_path
            .or_else(|| {
                std::env::var_os(CONFIG_PATH_ENV)
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate. A missing or empty file is the default configuration.
    pub fn load(&self) -> Result<OnSleepConfig, ConfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {:?}, using defaults", self.path);
                return Ok(OnSleepConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(OnSleepConfig::default());
        }

        let config: OnSleepConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Write atomically with mode 0600, creating the parent directory if needed.
    pub fn save(&self, config: &OnSleepConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let yaml = serde_yaml::to_string(config).map_err(|e| self.write_error(e))?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| self.write_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.write_error(e))?;
        }

        tmp.write_all(yaml.as_bytes())
            .map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_error(e))?;

        debug!("Wrote config to {:?}", self.path);
        Ok(())
    }

    /// Load, apply `f`, save. Returns the saved configuration.
    pub fn update<F>(&self, f: F) -> Result<OnSleepConfig, ConfigError>
    where
        F: FnOnce(&mut OnSleepConfig),
    {
        let mut config = self.load()?;
        f(&mut config);
        self.save(&config)?;
        Ok(config)
    }

    fn write_error(&self, e: impl std::fmt::Display) -> ConfigError {
        ConfigError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}
