//! Test utilities for the onsleep workspace
//!
//! Scripted stand-ins for the service directory, trigger runner and
//! transition log, a builder wiring them into a [`Controller`], and a fake
//! sysfs/procfs tree for the power source.
//!
//! [`Controller`]: onsleep_daemon::controller::Controller

pub mod helpers;

pub use helpers::controller_builder::{fast_policy, TestController, TestControllerBuilder};
pub use helpers::power_tree::FakePowerTree;
pub use helpers::recorders::{RecordingLog, RecordingTriggers};
pub use helpers::scripted_directory::{DirectoryCall, Gate, ScriptedDirectory};
pub use helpers::wait_utils::wait_for_phase;
