//! Thin platform helpers used by the OnSleep daemon.
//!
//! Nothing in here knows about sleep transitions. The daemon builds its
//! service directory, trigger runner and power source on top of these.

pub mod power_supply;
pub mod process;
pub mod systemctl;
