//! Hooks run as systemd units: a trigger id is a unit name started on demand
//! (typically a `Type=oneshot` service).

use tracing::debug;

use onsleep_unix::systemctl::Systemctl;

use crate::errors::TriggerError;
use crate::hooks::TriggerRunner;

#[derive(Debug, Clone, Default)]
pub struct SystemdTriggerRunner {
    systemctl: Systemctl,
}

impl SystemdTriggerRunner {
    pub fn new(systemctl: Systemctl) -> Self {
        Self { systemctl }
    }
}

impl TriggerRunner for SystemdTriggerRunner {
    fn run(&self, trigger_id: &str) -> Result<(), TriggerError> {
        let output = self
            .systemctl
            .run(["start", "--no-block", "--", trigger_id])
            .map_err(|source| TriggerError::Io {
                trigger: trigger_id.to_string(),
                source,
            })?;

        if !output.success() {
            return Err(TriggerError::Failed {
                trigger: trigger_id.to_string(),
                reason: format!(
                    "systemctl start exited with {}: {}",
                    output.code_or_signal(),
                    output.error_line()
                ),
            });
        }

        debug!("Queued start of trigger unit {}", trigger_id);
        Ok(())
    }
}
