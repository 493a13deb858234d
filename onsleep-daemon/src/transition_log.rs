//! Sink for transition events.
//!
//! The controller records what it does through this trait instead of calling
//! `tracing` directly, so tests can assert on the exact entries.

use std::sync::Arc;

/// Severity of a transition log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

pub trait TransitionLog: Send + Sync {
    fn record(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.record(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(Severity::Error, message);
    }
}

impl<T: TransitionLog + ?Sized> TransitionLog for Arc<T> {
    fn record(&self, severity: Severity, message: &str) {
        (**self).record(severity, message)
    }
}

/// Forwards entries to `tracing`; under systemd they end up in the journal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl TransitionLog for TracingLog {
    fn record(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!(target: "onsleep::transition", "{}", message),
            Severity::Warning => tracing::warn!(target: "onsleep::transition", "{}", message),
            Severity::Error => tracing::error!(target: "onsleep::transition", "{}", message),
        }
    }
}
