//! [`ServiceDirectory`] backed by systemd.
//!
//! Dependents of the anchor are the units listing it in `Requires=` or
//! `BindsTo=` (reported by systemd as the anchor's `RequiredBy` and `BoundBy`
//! properties), followed transitively. Only active `.service` units are kept.

use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use onsleep_unix::systemctl::{
    split_unit_list, Systemctl, SystemctlOutput, EXIT_NOT_LOADED, EXIT_NO_SUCH_UNIT,
};

use crate::errors::AdapterError;
use crate::service::{
    ServiceDirectory, ServiceName, ServiceRunState, StartResponse, StopResponse,
};

const STATE_PROPERTIES: &[&str] = &["LoadState", "ActiveState"];
const DEPENDENT_PROPERTIES: &[&str] = &["LoadState", "RequiredBy", "BoundBy"];

#[derive(Debug, Clone, Default)]
pub struct SystemdDirectory {
    systemctl: Systemctl,
}

impl SystemdDirectory {
    pub fn new(systemctl: Systemctl) -> Self {
        Self { systemctl }
    }

    fn show(
        &self,
        name: &ServiceName,
        properties: &[&str],
    ) -> Result<HashMap<String, String>, AdapterError> {
        let (output, props) = self.systemctl.show(name.as_str(), properties)?;
        if !output.success() {
            return Err(AdapterError::QueryFailed {
                service: name.clone(),
                code: output.code_or_signal(),
            });
        }
        if props.get("LoadState").map(String::as_str) == Some("not-found") {
            return Err(AdapterError::NotFound(name.clone()));
        }
        Ok(props)
    }

    fn control(&self, name: &ServiceName, action: &'static str) -> Result<(), AdapterError> {
        let output = self
            .systemctl
            .run([action, "--no-block", "--", name.as_str()])?;
        if output.success() {
            Ok(())
        } else {
            Err(control_error(name, action, &output))
        }
    }
}

impl ServiceDirectory for SystemdDirectory {
    fn ping(&self) -> Result<(), AdapterError> {
        let output = self
            .systemctl
            .run(["show", "--property=Version"])
            .map_err(|e| AdapterError::Unavailable(e.to_string()))?;
        if output.success() {
            debug!("systemd reachable: {}", output.stdout.trim());
            Ok(())
        } else {
            Err(AdapterError::Unavailable(format!(
                "systemctl exited with {}: {}",
                output.code_or_signal(),
                output.error_line()
            )))
        }
    }

    fn query_state(&self, name: &ServiceName) -> Result<ServiceRunState, AdapterError> {
        let props = self.show(name, STATE_PROPERTIES)?;
        Ok(map_active_state(
            props.get("ActiveState").map(String::as_str).unwrap_or(""),
        ))
    }

    fn enumerate_dependents(&self, anchor: &ServiceName) -> Result<Vec<ServiceName>, AdapterError> {
        let mut seen: HashSet<ServiceName> = HashSet::from([anchor.clone()]);
        let mut queue = VecDeque::from([anchor.clone()]);
        let mut dependents = Vec::new();

        while let Some(unit) = queue.pop_front() {
            let props = match self.show(&unit, DEPENDENT_PROPERTIES) {
                Ok(props) => props,
                // The anchor itself must be reachable; nested lookups are best effort
                Err(e) if unit == *anchor => {
                    return Err(match e {
                        AdapterError::QueryFailed { code, .. } => AdapterError::EnumerateFailed {
                            anchor: anchor.clone(),
                            code,
                        },
                        other => other,
                    });
                }
                Err(e) => {
                    warn!("Skipping dependents of {}: {}", unit, e);
                    continue;
                }
            };

            for candidate in dependent_units(&props) {
                if !seen.insert(candidate.clone()) {
                    continue;
                }
                match self.query_state(&candidate) {
                    Ok(state) if !state.is_stopped() => {
                        dependents.push(candidate.clone());
                        queue.push_back(candidate);
                    }
                    Ok(_) => debug!("Dependent {} is not active, ignoring", candidate),
                    Err(e) => warn!("Unable to query dependent {}: {}", candidate, e),
                }
            }
        }

        Ok(dependents)
    }

    fn request_stop(&self, name: &ServiceName) -> Result<StopResponse, AdapterError> {
        if self.query_state(name)?.is_stopped() {
            return Ok(StopResponse::AlreadyInactive);
        }
        self.control(name, "stop")?;
        Ok(StopResponse::Requested)
    }

    fn request_start(&self, name: &ServiceName) -> Result<StartResponse, AdapterError> {
        if matches!(
            self.query_state(name)?,
            ServiceRunState::Running | ServiceRunState::StartPending
        ) {
            return Ok(StartResponse::AlreadyRunning);
        }
        self.control(name, "start")?;
        Ok(StartResponse::Requested)
    }

    /// SIGKILL every process in the unit's cgroup, not just its main PID.
    fn force_terminate(&self, name: &ServiceName) -> Result<(), AdapterError> {
        if self.query_state(name)?.is_stopped() {
            debug!("{} stopped before it could be killed", name);
            return Ok(());
        }

        debug!("Killing all processes of {}", name);
        let output = self.systemctl.run(kill_command(name))?;
        if output.success() {
            Ok(())
        } else {
            Err(control_error(name, "kill", &output))
        }
    }
}

/// `systemctl kill` arguments: every process of the unit, unconditionally.
pub fn kill_command(name: &ServiceName) -> [&str; 4] {
    ["kill", "--signal=SIGKILL", "--", name.as_str()]
}

/// Map systemd's `ActiveState` onto the run states the sequencer knows.
pub fn map_active_state(active_state: &str) -> ServiceRunState {
    match active_state {
        "active" | "reloading" | "refreshing" => ServiceRunState::Running,
        "activating" => ServiceRunState::StartPending,
        "deactivating" => ServiceRunState::StopPending,
        "inactive" | "failed" => ServiceRunState::Stopped,
        _ => ServiceRunState::Other,
    }
}

/// `.service` units named by `RequiredBy` and `BoundBy`, in listed order.
pub fn dependent_units(props: &HashMap<String, String>) -> Vec<ServiceName> {
    let mut units: Vec<ServiceName> = Vec::new();
    for key in ["RequiredBy", "BoundBy"] {
        let Some(value) = props.get(key) else {
            continue;
        };
        for unit in split_unit_list(value).filter(|u| u.ends_with(".service")) {
            if !units.iter().any(|u| u == unit) {
                units.push(ServiceName::from(unit));
            }
        }
    }
    units
}

fn control_error(name: &ServiceName, action: &'static str, output: &SystemctlOutput) -> AdapterError {
    match output.code {
        Some(EXIT_NOT_LOADED) | Some(EXIT_NO_SUCH_UNIT) => AdapterError::NotFound(name.clone()),
        _ => AdapterError::ControlFailed {
            service: name.clone(),
            action,
            code: output.code_or_signal(),
            message: output.error_line().to_string(),
        },
    }
}
