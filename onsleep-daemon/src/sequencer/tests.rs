use super::*;
use crate::service::ServiceRunState;
use crate::transition_log::Severity;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Services stop after `stop_after` stop requests; `None` never stops.
#[derive(Default)]
struct FakeDirectory {
    dependents: Vec<ServiceName>,
    stop_after: HashMap<String, Option<u32>>,
    stop_requests: Mutex<HashMap<String, u32>>,
    terminated: Mutex<Vec<String>>,
    started: Mutex<Vec<String>>,
}

impl FakeDirectory {
    fn new(dependents: &[&str]) -> Self {
        Self {
            dependents: dependents.iter().map(|d| ServiceName::from(*d)).collect(),
            ..Default::default()
        }
    }

    fn stops_after(mut self, name: &str, requests: Option<u32>) -> Self {
        self.stop_after.insert(name.to_string(), requests);
        self
    }
}

impl ServiceDirectory for FakeDirectory {
    fn ping(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    fn query_state(&self, name: &ServiceName) -> Result<ServiceRunState, AdapterError> {
        let requests = self
            .stop_requests
            .lock()
            .get(name.as_str())
            .copied()
            .unwrap_or(0);
        let threshold = self.stop_after.get(name.as_str()).copied().unwrap_or(Some(1));
        Ok(match threshold {
            Some(n) if requests >= n => ServiceRunState::Stopped,
            _ => ServiceRunState::Running,
        })
    }

    fn enumerate_dependents(&self, _anchor: &ServiceName) -> Result<Vec<ServiceName>, AdapterError> {
        Ok(self.dependents.clone())
    }

    fn request_stop(&self, name: &ServiceName) -> Result<StopResponse, AdapterError> {
        *self
            .stop_requests
            .lock()
            .entry(name.to_string())
            .or_default() += 1;
        Ok(StopResponse::Requested)
    }

    fn request_start(&self, name: &ServiceName) -> Result<StartResponse, AdapterError> {
        self.started.lock().push(name.to_string());
        Ok(StartResponse::Requested)
    }

    fn force_terminate(&self, name: &ServiceName) -> Result<(), AdapterError> {
        self.terminated.lock().push(name.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct MemoryLog(Mutex<Vec<(Severity, String)>>);

impl TransitionLog for MemoryLog {
    fn record(&self, severity: Severity, message: &str) {
        self.0.lock().push((severity, message.to_string()));
    }
}

fn fast_policy(max_rounds: u32) -> StopPolicy {
    StopPolicy {
        max_rounds,
        round_interval: Duration::ZERO,
    }
}

fn sequencer(directory: Arc<FakeDirectory>, policy: StopPolicy) -> Sequencer {
    Sequencer::new(
        directory,
        Arc::new(MemoryLog::default()),
        policy,
        ShutdownSignal::new(),
    )
}

#[test]
fn test_default_policy_matches_constants() {
    let policy = StopPolicy::default();
    assert_eq!(policy.max_rounds, 30);
    assert_eq!(policy.round_interval, Duration::from_millis(500));
}

#[test]
fn test_set_puts_anchor_first_and_dedupes() {
    let set = StoppedServiceSet::new(
        "anchor".into(),
        vec!["a".into(), "anchor".into(), "b".into(), "a".into()],
    );
    let names: Vec<&str> = set.iter().map(ServiceName::as_str).collect();
    assert_eq!(names, vec!["anchor", "a", "b"]);
    assert_eq!(set.anchor().map(ServiceName::as_str), Some("anchor"));
}

#[test]
fn test_stop_all_single_round() {
    let directory = Arc::new(FakeDirectory::new(&["a", "b"]));
    let report = sequencer(directory.clone(), fast_policy(30))
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 1);
    assert!(report.forced.is_empty());
    assert!(!report.interrupted);
    assert!(directory.terminated.lock().is_empty());
}

#[test]
fn test_confirmed_services_are_not_asked_again() {
    let directory = Arc::new(FakeDirectory::new(&["fast", "slow"]).stops_after("slow", Some(3)));
    let report = sequencer(directory.clone(), fast_policy(30))
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 3);
    let requests = directory.stop_requests.lock();
    assert_eq!(requests.get("fast"), Some(&1));
    assert_eq!(requests.get("anchor"), Some(&1));
    assert_eq!(requests.get("slow"), Some(&3));
}

#[test]
fn test_escalation_after_exhausting_rounds() {
    let directory = Arc::new(FakeDirectory::new(&["a", "stuck"]).stops_after("stuck", None));
    let report = sequencer(directory.clone(), fast_policy(5))
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 5);
    assert_eq!(report.forced, vec![ServiceName::from("stuck")]);
    assert_eq!(*directory.terminated.lock(), vec!["stuck".to_string()]);
}

#[test]
fn test_zero_rounds_escalates_everything() {
    let directory = Arc::new(FakeDirectory::new(&["a"]));
    let report = sequencer(directory.clone(), fast_policy(0))
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 0);
    assert_eq!(report.forced.len(), 2);
    assert!(directory.stop_requests.lock().is_empty());
}

#[test]
fn test_shutdown_interrupts_and_skips_escalation() {
    let directory = Arc::new(FakeDirectory::new(&["stuck"]).stops_after("stuck", None));
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();
    let sequencer = Sequencer::new(
        directory.clone(),
        Arc::new(MemoryLog::default()),
        StopPolicy {
            max_rounds: 30,
            round_interval: Duration::from_secs(60),
        },
        shutdown,
    );

    let report = sequencer.stop_all(&"anchor".into()).unwrap();
    assert!(report.interrupted);
    assert_eq!(report.rounds, 1);
    assert!(report.forced.is_empty());
    assert!(directory.terminated.lock().is_empty());
}

#[test]
fn test_start_all_in_order() {
    let directory = Arc::new(FakeDirectory::new(&[]));
    let set = StoppedServiceSet::new("anchor".into(), vec!["x".into(), "y".into()]);
    let report = sequencer(directory.clone(), fast_policy(1)).start_all(&set);

    assert_eq!(report.attempted(), 3);
    assert_eq!(
        *directory.started.lock(),
        vec!["anchor".to_string(), "x".to_string(), "y".to_string()]
    );
}

#[test]
fn test_format_failure_includes_code() {
    let err = AdapterError::ControlFailed {
        service: "svc".into(),
        action: "stop",
        code: 5,
        message: "not loaded".into(),
    };
    let msg = format_failure("Unable to stop service svc", &err);
    assert!(msg.starts_with("Unable to stop service svc failed w/err 5"));

    let msg = format_failure("Unable to query service svc", &AdapterError::NotFound("svc".into()));
    assert_eq!(msg, "Unable to query service svc failed: Service not found: svc");
}
