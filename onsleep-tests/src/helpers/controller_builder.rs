//! Builder wiring scripted collaborators into a controller

use onsleep_daemon::controller::{Controller, ControllerParams, PowerSignal, TransitionReport};
use onsleep_daemon::hooks::HookConfig;
use onsleep_daemon::sequencer::StopPolicy;
use onsleep_daemon::service::ServiceName;
use onsleep_daemon::shutdown::ShutdownSignal;
use std::sync::Arc;
use std::time::Duration;

use super::recorders::{RecordingLog, RecordingTriggers};
use super::scripted_directory::ScriptedDirectory;

/// Stop policy with no pause between rounds
pub fn fast_policy(max_rounds: u32) -> StopPolicy {
    StopPolicy {
        max_rounds,
        round_interval: Duration::ZERO,
    }
}

pub struct TestControllerBuilder {
    directory: ScriptedDirectory,
    triggers: RecordingTriggers,
    hooks: HookConfig,
    anchor: ServiceName,
    policy: StopPolicy,
    shutdown: ShutdownSignal,
}

impl TestControllerBuilder {
    pub fn new(anchor: &str, directory: ScriptedDirectory) -> Self {
        Self {
            directory,
            triggers: RecordingTriggers::new(),
            hooks: HookConfig::default(),
            anchor: anchor.into(),
            policy: fast_policy(30),
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn with_hooks(mut self, on_sleep: Option<&str>, on_wake: Option<&str>) -> Self {
        self.hooks = HookConfig::new(on_sleep.map(String::from), on_wake.map(String::from));
        self
    }

    pub fn with_triggers(mut self, triggers: RecordingTriggers) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_policy(mut self, policy: StopPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn build(self) -> TestController {
        let directory = Arc::new(self.directory);
        let triggers = Arc::new(self.triggers);
        let log = Arc::new(RecordingLog::new());

        let controller = Arc::new(Controller::new(ControllerParams {
            directory: directory.clone(),
            triggers: triggers.clone(),
            log: log.clone(),
            hooks: self.hooks,
            anchor: self.anchor,
            policy: self.policy,
            shutdown: self.shutdown,
        }));

        TestController {
            controller,
            directory,
            triggers,
            log,
        }
    }
}

/// A controller plus handles on everything it talks to
pub struct TestController {
    pub controller: Arc<Controller>,
    pub directory: Arc<ScriptedDirectory>,
    pub triggers: Arc<RecordingTriggers>,
    pub log: Arc<RecordingLog>,
}

impl TestController {
    pub fn signal(&self, signal: PowerSignal) -> Option<TransitionReport> {
        self.controller.on_power_signal(signal)
    }

    /// Lid closed, then AC unplugged
    pub fn sleep(&self) -> Option<TransitionReport> {
        self.signal(PowerSignal::LidStateChanged { open: false });
        self.signal(PowerSignal::AcPowerChanged { on_battery: true })
    }

    pub fn open_lid(&self) -> Option<TransitionReport> {
        self.signal(PowerSignal::LidStateChanged { open: true })
    }
}
