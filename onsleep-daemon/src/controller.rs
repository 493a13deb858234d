//! Power-state transition controller.
//!
//! Turns raw power notifications into at most one in-flight sleep or resume
//! half-cycle. Everything happens inside one mutex: a notification arriving
//! mid-transition blocks until the current half-cycle finishes, then
//! re-evaluates the guards against the latest observation.

mod state;

pub use state::{PowerObservation, PowerSignal, TransitionPhase};

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{ControllerError, Result};
use crate::hooks::{fire_hook, HookConfig, HookKind, HookOutcome, TriggerRunner};
use crate::sequencer::{
    format_failure, Sequencer, StartReport, StopPolicy, StopReport, StoppedServiceSet,
};
use crate::service::{ServiceDirectory, ServiceName};
use crate::shutdown::ShutdownSignal;
use crate::transition_log::TransitionLog;

/// Which half of the cycle a report describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfCycle {
    Sleep,
    Resume,
}

/// Summary of one guarded half-cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    pub half_cycle: HalfCycle,
    /// Phase the controller settled in
    pub phase: TransitionPhase,
    pub stop: Option<StopReport>,
    pub start: Option<StartReport>,
    pub hook: HookOutcome,
    /// The stop sequence could not begin; nothing was stopped
    pub aborted: bool,
}

/// Collaborators handed to [`Controller::new`]
pub struct ControllerParams {
    pub directory: Arc<dyn ServiceDirectory>,
    pub triggers: Arc<dyn TriggerRunner>,
    pub log: Arc<dyn TransitionLog>,
    pub hooks: HookConfig,
    pub anchor: ServiceName,
    pub policy: StopPolicy,
    pub shutdown: ShutdownSignal,
}

#[derive(Default)]
struct ControllerState {
    phase: TransitionPhase,
    observation: PowerObservation,
    /// Set captured by the last stop sequence, consumed by the next resume
    stopped: Option<StoppedServiceSet>,
}

pub struct Controller {
    state: Mutex<ControllerState>,
    sequencer: Sequencer,
    triggers: Arc<dyn TriggerRunner>,
    log: Arc<dyn TransitionLog>,
    hooks: HookConfig,
    anchor: ServiceName,
}

impl Controller {
    pub fn new(params: ControllerParams) -> Self {
        let ControllerParams {
            directory,
            triggers,
            log,
            hooks,
            anchor,
            policy,
            shutdown,
        } = params;

        Self {
            state: Mutex::new(ControllerState::default()),
            sequencer: Sequencer::new(directory, log.clone(), policy, shutdown),
            triggers,
            log,
            hooks,
            anchor,
        }
    }

    pub fn anchor(&self) -> &ServiceName {
        &self.anchor
    }

    pub fn hooks(&self) -> &HookConfig {
        &self.hooks
    }

    pub fn phase(&self) -> TransitionPhase {
        self.state.lock().phase
    }

    pub fn observation(&self) -> PowerObservation {
        self.state.lock().observation
    }

    /// Services waiting to be restarted by the next resume
    pub fn stopped_services(&self) -> Option<StoppedServiceSet> {
        self.state.lock().stopped.clone()
    }

    /// Feed one power notification. Returns the report of the half-cycle it
    /// triggered, if any. Never fails: transition errors are logged.
    pub fn on_power_signal(&self, signal: PowerSignal) -> Option<TransitionReport> {
        let mut state = self.state.lock();
        state.observation.apply(signal);
        self.log.info(&state.observation.to_string());

        if state.phase == TransitionPhase::Awake && state.observation.wants_sleep() {
            return Some(self.enter_sleep(&mut state));
        }
        if state.phase == TransitionPhase::Asleep && state.observation.wants_resume() {
            return Some(self.resume(&mut state));
        }

        debug!("No transition for {:?} in phase {}", signal, state.phase);
        None
    }

    fn enter_sleep(&self, state: &mut ControllerState) -> TransitionReport {
        self.advance(state, TransitionPhase::EnteringSleep);
        self.log.info("Entering sleep transition");

        let stop = match self.sequencer.stop_all(&self.anchor) {
            Ok(report) => report,
            Err(e) => {
                self.log.error(&format_failure("Sleep transition", &e));
                self.advance(state, TransitionPhase::Awake);
                return TransitionReport {
                    half_cycle: HalfCycle::Sleep,
                    phase: state.phase,
                    stop: None,
                    start: None,
                    hook: HookOutcome::Skipped,
                    aborted: true,
                };
            }
        };
        state.stopped = Some(stop.set.clone());

        let hook = self.run_hook(HookKind::OnSleep);
        self.advance(state, TransitionPhase::Asleep);

        let report = TransitionReport {
            half_cycle: HalfCycle::Sleep,
            phase: state.phase,
            stop: Some(stop),
            start: None,
            hook,
            aborted: false,
        };
        self.log_report(&report);
        report
    }

    fn resume(&self, state: &mut ControllerState) -> TransitionReport {
        self.advance(state, TransitionPhase::Resuming);
        self.log.info("Entering wakeup transition");

        let hook = self.run_hook(HookKind::OnWake);
        let set = state.stopped.take().unwrap_or_default();
        let start = self.sequencer.start_all(&set);
        self.advance(state, TransitionPhase::Awake);

        let report = TransitionReport {
            half_cycle: HalfCycle::Resume,
            phase: state.phase,
            stop: None,
            start: Some(start),
            hook,
            aborted: false,
        };
        self.log_report(&report);
        report
    }

    fn run_hook(&self, kind: HookKind) -> HookOutcome {
        match fire_hook(self.triggers.as_ref(), &self.hooks, kind) {
            Ok(outcome) => outcome,
            Err(e) => {
                let trigger = self.hooks.trigger(kind).unwrap_or_default().to_string();
                let err = ControllerError::from(e);
                self.log
                    .error(&format!("{} trigger failed during transition: {}", kind, err));
                HookOutcome::Failed {
                    trigger,
                    reason: err.to_string(),
                }
            }
        }
    }

    fn advance(&self, state: &mut ControllerState, next: TransitionPhase) {
        if let Err(e) = check_transition(state.phase, next) {
            self.log.error(&e.to_string());
            return;
        }
        debug!("Phase {} -> {}", state.phase, next);
        state.phase = next;
    }

    fn log_report(&self, report: &TransitionReport) {
        match report.half_cycle {
            HalfCycle::Sleep => {
                if let Some(stop) = &report.stop {
                    self.log.info(&format!(
                        "Sleep transition complete: {} service(s) stopped in {} round(s), {} killed",
                        stop.set.len(),
                        stop.rounds,
                        stop.forced.len()
                    ));
                }
            }
            HalfCycle::Resume => {
                if let Some(start) = &report.start {
                    self.log.info(&format!(
                        "Wakeup transition complete: {} service(s) restarted, {} failed",
                        start.started.len() + start.already_running.len(),
                        start.failed.len()
                    ));
                }
            }
        }
    }
}

/// Validate a phase change against the allowed cycle.
pub fn check_transition(from: TransitionPhase, to: TransitionPhase) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ControllerError::IllegalTransition { from, to })
    }
}
