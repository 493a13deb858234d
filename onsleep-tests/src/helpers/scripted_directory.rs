//! In-memory service directory driven by per-service state scripts

use onsleep_daemon::errors::AdapterError;
use onsleep_daemon::service::{
    ServiceDirectory, ServiceName, ServiceRunState, StartResponse, StopResponse,
};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One call made against the directory, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    Ping,
    Query(String),
    Enumerate(String),
    Stop(String),
    Start(String),
    Terminate(String),
}

/// Blocks a call until opened. Lets tests hold a transition mid-flight.
#[derive(Default)]
pub struct Gate {
    state: Mutex<GateState>,
    cvar: Condvar,
}

#[derive(Default)]
struct GateState {
    entered: bool,
    open: bool,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        self.state.lock().open = true;
        self.cvar.notify_all();
    }

    /// Wait until some call is parked at the gate
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.entered {
            if self.cvar.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.entered
    }

    fn pass(&self) {
        let mut state = self.state.lock();
        state.entered = true;
        self.cvar.notify_all();
        while !state.open {
            self.cvar.wait(&mut state);
        }
    }
}

#[derive(Default)]
struct Inner {
    /// Popped one per query; the last entry is sticky
    states: HashMap<String, VecDeque<ServiceRunState>>,
    dependents: HashMap<String, Vec<ServiceName>>,
    stop_responses: HashMap<String, StopResponse>,
    start_responses: HashMap<String, StartResponse>,
    fail_ping: bool,
    fail_enumerate: HashSet<String>,
    fail_query: HashSet<String>,
    fail_stop: HashMap<String, i32>,
    fail_start: HashMap<String, i32>,
    fail_terminate: HashSet<String>,
    calls: Vec<DirectoryCall>,
}

/// Unscripted services report `Stopped`.
#[derive(Default)]
pub struct ScriptedDirectory {
    inner: Mutex<Inner>,
    enumerate_gate: Mutex<Option<Arc<Gate>>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dependents(self, anchor: &str, dependents: &[&str]) -> Self {
        self.inner.lock().dependents.insert(
            anchor.to_string(),
            dependents.iter().map(|d| ServiceName::from(*d)).collect(),
        );
        self
    }

    /// States returned by successive queries of `name`
    pub fn with_states(self, name: &str, states: &[ServiceRunState]) -> Self {
        self.inner
            .lock()
            .states
            .insert(name.to_string(), states.iter().copied().collect());
        self
    }

    pub fn with_state(self, name: &str, state: ServiceRunState) -> Self {
        self.with_states(name, &[state])
    }

    pub fn with_stop_response(self, name: &str, response: StopResponse) -> Self {
        self.inner
            .lock()
            .stop_responses
            .insert(name.to_string(), response);
        self
    }

    pub fn with_start_response(self, name: &str, response: StartResponse) -> Self {
        self.inner
            .lock()
            .start_responses
            .insert(name.to_string(), response);
        self
    }

    pub fn failing_ping(self) -> Self {
        self.inner.lock().fail_ping = true;
        self
    }

    pub fn failing_enumerate(self, anchor: &str) -> Self {
        self.inner.lock().fail_enumerate.insert(anchor.to_string());
        self
    }

    pub fn failing_query(self, name: &str) -> Self {
        self.inner.lock().fail_query.insert(name.to_string());
        self
    }

    pub fn failing_stop(self, name: &str, code: i32) -> Self {
        self.inner.lock().fail_stop.insert(name.to_string(), code);
        self
    }

    pub fn failing_start(self, name: &str, code: i32) -> Self {
        self.inner.lock().fail_start.insert(name.to_string(), code);
        self
    }

    pub fn failing_terminate(self, name: &str) -> Self {
        self.inner.lock().fail_terminate.insert(name.to_string());
        self
    }

    /// Park `enumerate_dependents` at `gate` until it opens
    pub fn with_enumerate_gate(self, gate: Arc<Gate>) -> Self {
        *self.enumerate_gate.lock() = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.inner.lock().calls.clone()
    }

    pub fn stop_requests(&self) -> Vec<String> {
        self.filter_calls(|c| match c {
            DirectoryCall::Stop(n) => Some(n.clone()),
            _ => None,
        })
    }

    pub fn start_requests(&self) -> Vec<String> {
        self.filter_calls(|c| match c {
            DirectoryCall::Start(n) => Some(n.clone()),
            _ => None,
        })
    }

    pub fn terminations(&self) -> Vec<String> {
        self.filter_calls(|c| match c {
            DirectoryCall::Terminate(n) => Some(n.clone()),
            _ => None,
        })
    }

    pub fn enumerations(&self) -> usize {
        self.filter_calls(|c| match c {
            DirectoryCall::Enumerate(n) => Some(n.clone()),
            _ => None,
        })
        .len()
    }

    fn filter_calls<F>(&self, f: F) -> Vec<String>
    where
        F: Fn(&DirectoryCall) -> Option<String>,
    {
        self.inner.lock().calls.iter().filter_map(f).collect()
    }

    fn record(&self, call: DirectoryCall) {
        self.inner.lock().calls.push(call);
    }
}

impl ServiceDirectory for ScriptedDirectory {
    fn ping(&self) -> Result<(), AdapterError> {
        self.record(DirectoryCall::Ping);
        if self.inner.lock().fail_ping {
            return Err(AdapterError::Unavailable("scripted failure".to_string()));
        }
        Ok(())
    }

    fn query_state(&self, name: &ServiceName) -> Result<ServiceRunState, AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DirectoryCall::Query(name.to_string()));
        if inner.fail_query.contains(name.as_str()) {
            return Err(AdapterError::QueryFailed {
                service: name.clone(),
                code: 1,
            });
        }
        let state = match inner.states.get_mut(name.as_str()) {
            Some(script) if script.len() > 1 => script.pop_front(),
            Some(script) => script.front().copied(),
            None => None,
        };
        Ok(state.unwrap_or(ServiceRunState::Stopped))
    }

    fn enumerate_dependents(&self, anchor: &ServiceName) -> Result<Vec<ServiceName>, AdapterError> {
        self.record(DirectoryCall::Enumerate(anchor.to_string()));

        let gate = self.enumerate_gate.lock().clone();
        if let Some(gate) = gate {
            gate.pass();
        }

        let inner = self.inner.lock();
        if inner.fail_enumerate.contains(anchor.as_str()) {
            return Err(AdapterError::NotFound(anchor.clone()));
        }
        Ok(inner
            .dependents
            .get(anchor.as_str())
            .cloned()
            .unwrap_or_default())
    }

    fn request_stop(&self, name: &ServiceName) -> Result<StopResponse, AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DirectoryCall::Stop(name.to_string()));
        if let Some(code) = inner.fail_stop.get(name.as_str()) {
            return Err(AdapterError::ControlFailed {
                service: name.clone(),
                action: "stop",
                code: *code,
                message: "scripted failure".to_string(),
            });
        }
        Ok(inner
            .stop_responses
            .get(name.as_str())
            .copied()
            .unwrap_or(StopResponse::Requested))
    }

    fn request_start(&self, name: &ServiceName) -> Result<StartResponse, AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DirectoryCall::Start(name.to_string()));
        if let Some(code) = inner.fail_start.get(name.as_str()) {
            return Err(AdapterError::ControlFailed {
                service: name.clone(),
                action: "start",
                code: *code,
                message: "scripted failure".to_string(),
            });
        }
        Ok(inner
            .start_responses
            .get(name.as_str())
            .copied()
            .unwrap_or(StartResponse::Requested))
    }

    fn force_terminate(&self, name: &ServiceName) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DirectoryCall::Terminate(name.to_string()));
        if inner.fail_terminate.contains(name.as_str()) {
            return Err(AdapterError::ControlFailed {
                service: name.clone(),
                action: "kill",
                code: 1,
                message: "scripted failure".to_string(),
            });
        }
        Ok(())
    }
}
