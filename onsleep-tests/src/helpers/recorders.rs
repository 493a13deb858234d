//! Recording trigger runner and transition log

use onsleep_daemon::errors::TriggerError;
use onsleep_daemon::hooks::TriggerRunner;
use onsleep_daemon::transition_log::{Severity, TransitionLog};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Records every trigger run; ids marked failing return an error.
#[derive(Default)]
pub struct RecordingTriggers {
    runs: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl RecordingTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, trigger_id: &str) -> Self {
        self.failing.insert(trigger_id.to_string());
        self
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().clone()
    }
}

impl TriggerRunner for RecordingTriggers {
    fn run(&self, trigger_id: &str) -> Result<(), TriggerError> {
        self.runs.lock().push(trigger_id.to_string());
        if self.failing.contains(trigger_id) {
            return Err(TriggerError::Failed {
                trigger: trigger_id.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().clone()
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Severity::Warning)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|(_, m)| m.contains(needle))
    }
}

impl TransitionLog for RecordingLog {
    fn record(&self, severity: Severity, message: &str) {
        self.entries.lock().push((severity, message.to_string()));
    }
}
