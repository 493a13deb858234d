//! Linux bindings for the controller's collaborators.
//!
//! - [`systemd::SystemdDirectory`]: the service directory, via `systemctl`
//! - [`triggers::SystemdTriggerRunner`]: hooks are units started on demand
//! - [`power::PowerSource`]: AC and lid state polled from sysfs/procfs
//! - [`install::UnitInstaller`]: `--install` / `--uninstall`

pub mod install;
pub mod power;
pub mod systemd;
pub mod triggers;

pub use install::UnitInstaller;
pub use power::{PowerSource, PowerSourceHandle};
pub use systemd::SystemdDirectory;
pub use triggers::SystemdTriggerRunner;
