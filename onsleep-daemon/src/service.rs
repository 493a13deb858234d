//! The service directory contract consumed by the sequencer.

use std::fmt;
use std::sync::Arc;

use crate::errors::AdapterError;

/// Opaque, case-preserved name of one OS service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ServiceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for ServiceName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ServiceName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Run state of a service at query time. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRunState {
    Stopped,
    StopPending,
    Running,
    StartPending,
    Other,
}

impl ServiceRunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRunState::Stopped => "stopped",
            ServiceRunState::StopPending => "stop_pending",
            ServiceRunState::Running => "running",
            ServiceRunState::StartPending => "start_pending",
            ServiceRunState::Other => "other",
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ServiceRunState::Stopped)
    }
}

impl fmt::Display for ServiceRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful answers to a graceful stop request.
///
/// `AlreadyInactive` and `BlockedByDependents` are not failures: the
/// sequencer records them and retries next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopResponse {
    Requested,
    AlreadyInactive,
    BlockedByDependents,
}

/// Successful answers to a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartResponse {
    Requested,
    AlreadyRunning,
}

/// Capability to inspect and control OS services.
///
/// Implementations translate host status codes into [`AdapterError`] at the
/// boundary. All calls are synchronous; the sequencer invokes them while
/// holding the controller lock.
pub trait ServiceDirectory: Send + Sync {
    /// Check that the service directory itself is reachable.
    fn ping(&self) -> Result<(), AdapterError>;

    fn query_state(&self, name: &ServiceName) -> Result<ServiceRunState, AdapterError>;

    /// Active services currently depending on `anchor`. Point-in-time; may be empty.
    fn enumerate_dependents(&self, anchor: &ServiceName) -> Result<Vec<ServiceName>, AdapterError>;

    fn request_stop(&self, name: &ServiceName) -> Result<StopResponse, AdapterError>;

    fn request_start(&self, name: &ServiceName) -> Result<StartResponse, AdapterError>;

    /// Locate the backing process and end it unconditionally.
    fn force_terminate(&self, name: &ServiceName) -> Result<(), AdapterError>;
}

impl<T: ServiceDirectory + ?Sized> ServiceDirectory for Arc<T> {
    fn ping(&self) -> Result<(), AdapterError> {
        (**self).ping()
    }

    fn query_state(&self, name: &ServiceName) -> Result<ServiceRunState, AdapterError> {
        (**self).query_state(name)
    }

    fn enumerate_dependents(&self, anchor: &ServiceName) -> Result<Vec<ServiceName>, AdapterError> {
        (**self).enumerate_dependents(anchor)
    }

    fn request_stop(&self, name: &ServiceName) -> Result<StopResponse, AdapterError> {
        (**self).request_stop(name)
    }

    fn request_start(&self, name: &ServiceName) -> Result<StartResponse, AdapterError> {
        (**self).request_start(name)
    }

    fn force_terminate(&self, name: &ServiceName) -> Result<(), AdapterError> {
        (**self).force_terminate(name)
    }
}
