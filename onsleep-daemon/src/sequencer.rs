//! Stop/start sequencing for the services anchored at one well-known service.
//!
//! Stop path:
//! 1. Snapshot the anchor's active dependents: `[anchor] ++ dependents`
//! 2. Up to [`STOP_ROUNDS`] rounds, [`STOP_ROUND_INTERVAL`] apart: send a
//!    graceful stop to every member the last query saw running, then
//!    re-query the whole set
//! 3. Re-query the whole set once more and force-terminate anything not
//!    stopped
//!
//! Start path restarts exactly the recorded set, in recorded order.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::AdapterError;
use crate::service::{ServiceDirectory, ServiceName, StartResponse, StopResponse};
use crate::shutdown::ShutdownSignal;
use crate::transition_log::TransitionLog;

/// Maximum number of graceful stop rounds before escalation
pub const STOP_ROUNDS: u32 = 30;

/// Pause between two stop rounds
pub const STOP_ROUND_INTERVAL: Duration = Duration::from_millis(500);

/// Bounds of the graceful stop loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    pub max_rounds: u32,
    pub round_interval: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            max_rounds: STOP_ROUNDS,
            round_interval: STOP_ROUND_INTERVAL,
        }
    }
}

/// Services stopped by one stop sequence: anchor first, then its dependents
/// as enumerated when the sequence began.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoppedServiceSet(Vec<ServiceName>);

impl StoppedServiceSet {
    /// Build the set; an anchor listed among its own dependents is not repeated.
    pub fn new(anchor: ServiceName, dependents: Vec<ServiceName>) -> Self {
        let mut services = Vec::with_capacity(dependents.len() + 1);
        services.push(anchor);
        for dependent in dependents {
            if !services.contains(&dependent) {
                services.push(dependent);
            }
        }
        Self(services)
    }

    pub fn anchor(&self) -> Option<&ServiceName> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ServiceName] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ServiceName> {
        self.0
    }
}

impl<'a> IntoIterator for &'a StoppedServiceSet {
    type Item = &'a ServiceName;
    type IntoIter = std::slice::Iter<'a, ServiceName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Outcome of one stop sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub set: StoppedServiceSet,
    /// Graceful rounds actually run
    pub rounds: u32,
    /// Services escalated to forced termination
    pub forced: Vec<ServiceName>,
    /// Subset of `forced` whose termination failed
    pub failed_kills: Vec<ServiceName>,
    /// Shutdown cut the retry loop short; escalation was skipped
    pub interrupted: bool,
}

/// Outcome of one start sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartReport {
    pub started: Vec<ServiceName>,
    pub already_running: Vec<ServiceName>,
    pub failed: Vec<ServiceName>,
}

impl StartReport {
    pub fn attempted(&self) -> usize {
        self.started.len() + self.already_running.len() + self.failed.len()
    }
}

/// Drives a dependency set through the stop and start protocols.
pub struct Sequencer {
    directory: Arc<dyn ServiceDirectory>,
    log: Arc<dyn TransitionLog>,
    policy: StopPolicy,
    shutdown: ShutdownSignal,
}

impl Sequencer {
    pub fn new(
        directory: Arc<dyn ServiceDirectory>,
        log: Arc<dyn TransitionLog>,
        policy: StopPolicy,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            directory,
            log,
            policy,
            shutdown,
        }
    }

    pub fn policy(&self) -> StopPolicy {
        self.policy
    }

    /// Stop `anchor` and everything currently depending on it.
    ///
    /// Only discovery failures are returned; per-service failures are logged
    /// and contained.
    pub fn stop_all(&self, anchor: &ServiceName) -> Result<StopReport, AdapterError> {
        let dependents = self.directory.enumerate_dependents(anchor)?;
        let set = StoppedServiceSet::new(anchor.clone(), dependents);

        self.log.info(&format!(
            "Stopping {} service(s): {}",
            set.len(),
            set.iter().map(ServiceName::as_str).collect::<Vec<_>>().join(", ")
        ));

        let mut pending: Vec<&ServiceName> = set.iter().collect();
        let mut rounds = 0;
        let mut interrupted = false;

        while rounds < self.policy.max_rounds && !pending.is_empty() {
            rounds += 1;

            for name in &pending {
                self.send_stop(name);
            }

            // Every member is re-checked: one confirmed earlier may be back up
            pending = self.still_running(&set);
            if pending.is_empty() {
                break;
            }

            debug!(
                "Stop round {}/{}: {} service(s) still running",
                rounds,
                self.policy.max_rounds,
                pending.len()
            );

            if rounds < self.policy.max_rounds
                && !self.shutdown.wait_timeout(self.policy.round_interval)
            {
                interrupted = true;
                break;
            }
        }

        let mut forced = Vec::new();
        let mut failed_kills = Vec::new();

        if interrupted {
            self.log.warn(&format!(
                "Shutdown requested during stop sequence, {} service(s) left running",
                pending.len()
            ));
        } else {
            for name in self.still_running(&set) {
                self.log
                    .warn(&format!("Service {} still running, killing it", name));
                forced.push(name.clone());
                if let Err(e) = self.directory.force_terminate(name) {
                    self.log.error(&format_failure(
                        &format!("Unable to terminate service {}", name),
                        &e,
                    ));
                    failed_kills.push(name.clone());
                }
            }
        }

        Ok(StopReport {
            set,
            rounds,
            forced,
            failed_kills,
            interrupted,
        })
    }

    /// Start every member of `set` in recorded order. Best effort across the
    /// whole set.
    pub fn start_all(&self, set: &StoppedServiceSet) -> StartReport {
        let mut report = StartReport::default();

        for name in set {
            match self.directory.request_start(name) {
                Ok(StartResponse::Requested) => {
                    debug!("Start requested for {}", name);
                    report.started.push(name.clone());
                }
                Ok(StartResponse::AlreadyRunning) => {
                    debug!("Service {} already running", name);
                    report.already_running.push(name.clone());
                }
                Err(e) => {
                    self.log.error(&format_failure(
                        &format!("Unable to start service {}", name),
                        &e,
                    ));
                    report.failed.push(name.clone());
                }
            }
        }

        report
    }

    fn send_stop(&self, name: &ServiceName) {
        match self.directory.request_stop(name) {
            Ok(StopResponse::Requested) => debug!("Stop requested for {}", name),
            Ok(StopResponse::AlreadyInactive) => debug!("Service {} already inactive", name),
            Ok(StopResponse::BlockedByDependents) => {
                debug!("Service {} blocked by running dependents, retrying", name)
            }
            Err(e) => self.log.error(&format_failure(
                &format!("Unable to stop service {}", name),
                &e,
            )),
        }
    }

    /// Members of `set` not reporting `Stopped`, in set order.
    fn still_running<'a>(&self, set: &'a StoppedServiceSet) -> Vec<&'a ServiceName> {
        set.iter().filter(|name| !self.confirm_stopped(name)).collect()
    }

    /// A failed query counts as "still running".
    fn confirm_stopped(&self, name: &ServiceName) -> bool {
        match self.directory.query_state(name) {
            Ok(state) => state.is_stopped(),
            Err(e) => {
                self.log.warn(&format_failure(
                    &format!("Unable to query service {}", name),
                    &e,
                ));
                false
            }
        }
    }
}

/// `"<operation> failed w/err <code>: <error>"`, the code omitted when unknown.
pub(crate) fn format_failure(operation: &str, error: &AdapterError) -> String {
    match error.code() {
        Some(code) => format!("{} failed w/err {}: {}", operation, code, error),
        None => format!("{} failed: {}", operation, error),
    }
}

#[cfg(test)]
mod tests;
