//! Stop/start sequencing against a scripted service directory

use onsleep_daemon::sequencer::{Sequencer, StoppedServiceSet};
use onsleep_daemon::service::{ServiceName, ServiceRunState, StartResponse, StopResponse};
use onsleep_daemon::shutdown::ShutdownSignal;
use onsleep_tests::{fast_policy, RecordingLog, ScriptedDirectory};
use std::sync::Arc;

fn sequencer(directory: &Arc<ScriptedDirectory>, log: &Arc<RecordingLog>, rounds: u32) -> Sequencer {
    Sequencer::new(
        directory.clone(),
        log.clone(),
        fast_policy(rounds),
        ShutdownSignal::new(),
    )
}

fn names(set: &StoppedServiceSet) -> Vec<&str> {
    set.iter().map(ServiceName::as_str).collect()
}

#[test]
fn test_all_stopped_after_first_round() {
    let directory = Arc::new(
        ScriptedDirectory::new().with_dependents("anchor", &["a", "b", "c"]),
    );
    let log = Arc::new(RecordingLog::new());

    let report = sequencer(&directory, &log, 30)
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 1);
    assert_eq!(names(&report.set), vec!["anchor", "a", "b", "c"]);
    assert!(directory.terminations().is_empty());
    assert_eq!(directory.stop_requests().len(), 4);
    assert!(log.errors().is_empty());
}

#[test]
fn test_stuck_dependent_is_killed_after_all_rounds() {
    let directory = Arc::new(
        ScriptedDirectory::new()
            .with_dependents("anchor", &["a", "stuck"])
            .with_state("stuck", ServiceRunState::Running),
    );
    let log = Arc::new(RecordingLog::new());

    let report = sequencer(&directory, &log, 30)
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 30);
    assert_eq!(directory.terminations(), vec!["stuck".to_string()]);
    assert_eq!(
        directory
            .stop_requests()
            .iter()
            .filter(|n| n.as_str() == "stuck")
            .count(),
        30
    );
    assert!(log.contains("Service stuck still running, killing it"));
}

#[test]
fn test_inactive_and_blocked_responses_are_not_errors() {
    let directory = Arc::new(
        ScriptedDirectory::new()
            .with_dependents("anchor", &["idle", "blocked"])
            .with_stop_response("idle", StopResponse::AlreadyInactive)
            .with_stop_response("blocked", StopResponse::BlockedByDependents)
            .with_states(
                "blocked",
                &[ServiceRunState::Running, ServiceRunState::Stopped],
            ),
    );
    let log = Arc::new(RecordingLog::new());

    let report = sequencer(&directory, &log, 30)
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 2);
    assert!(report.forced.is_empty());
    assert!(log.errors().is_empty());
}

#[test]
fn test_failed_query_counts_as_running() {
    let directory = Arc::new(
        ScriptedDirectory::new()
            .with_dependents("anchor", &["opaque"])
            .failing_query("opaque"),
    );
    let log = Arc::new(RecordingLog::new());

    let report = sequencer(&directory, &log, 3)
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 3);
    assert_eq!(directory.terminations(), vec!["opaque".to_string()]);
    // One failed query per round plus the check before escalation
    assert_eq!(log.warnings().iter().filter(|w| w.contains("Unable to query service opaque")).count(), 4);
}

#[test]
fn test_service_restarting_after_confirmed_stop_is_stopped_again() {
    let directory = Arc::new(
        ScriptedDirectory::new()
            .with_dependents("anchor", &["a", "stuck"])
            .with_states("a", &[ServiceRunState::Stopped, ServiceRunState::Running])
            .with_state("stuck", ServiceRunState::Running),
    );
    let log = Arc::new(RecordingLog::new());

    let report = sequencer(&directory, &log, 3)
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 3);
    // Round 1 and round 3: `a` came back up after round 1 confirmed it stopped
    let stops_to_a = directory
        .stop_requests()
        .iter()
        .filter(|n| n.as_str() == "a")
        .count();
    assert_eq!(stops_to_a, 2);
    assert_eq!(directory.terminations(), vec!["a".to_string(), "stuck".to_string()]);
    assert_eq!(report.forced, vec![ServiceName::from("a"), ServiceName::from("stuck")]);
}

#[test]
fn test_escalation_rechecks_services_stopped_early() {
    // Everything stops in round 1, then `late` restarts before escalation
    let directory = Arc::new(
        ScriptedDirectory::new()
            .with_dependents("anchor", &["late"])
            .with_states("late", &[ServiceRunState::Stopped, ServiceRunState::Running]),
    );
    let log = Arc::new(RecordingLog::new());

    let report = sequencer(&directory, &log, 30)
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.rounds, 1);
    assert_eq!(directory.terminations(), vec!["late".to_string()]);
}

#[test]
fn test_stop_failure_is_logged_with_code_and_loop_continues() {
    let directory = Arc::new(
        ScriptedDirectory::new()
            .with_dependents("anchor", &["denied", "ok"])
            .failing_stop("denied", 5)
            .with_state("denied", ServiceRunState::Running),
    );
    let log = Arc::new(RecordingLog::new());

    let report = sequencer(&directory, &log, 2)
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(report.forced, vec![ServiceName::from("denied")]);
    assert!(directory.stop_requests().contains(&"ok".to_string()));
    assert!(log
        .errors()
        .iter()
        .any(|e| e.starts_with("Unable to stop service denied failed w/err 5")));
}

#[test]
fn test_terminate_failure_is_contained() {
    let directory = Arc::new(
        ScriptedDirectory::new()
            .with_dependents("anchor", &["x", "y"])
            .with_state("x", ServiceRunState::Running)
            .with_state("y", ServiceRunState::StopPending)
            .failing_terminate("x"),
    );
    let log = Arc::new(RecordingLog::new());

    let report = sequencer(&directory, &log, 1)
        .stop_all(&"anchor".into())
        .unwrap();

    assert_eq!(directory.terminations(), vec!["x".to_string(), "y".to_string()]);
    assert_eq!(report.failed_kills, vec![ServiceName::from("x")]);
    assert!(log.errors().iter().any(|e| e.contains("Unable to terminate service x")));
}

#[test]
fn test_enumerate_failure_is_returned() {
    let directory = Arc::new(ScriptedDirectory::new().failing_enumerate("anchor"));
    let log = Arc::new(RecordingLog::new());

    assert!(sequencer(&directory, &log, 30)
        .stop_all(&"anchor".into())
        .is_err());
    assert!(directory.stop_requests().is_empty());
}

#[test]
fn test_start_all_attempts_every_member_in_order() {
    let directory = Arc::new(
        ScriptedDirectory::new()
            .failing_start("b", 1)
            .with_start_response("c", StartResponse::AlreadyRunning),
    );
    let log = Arc::new(RecordingLog::new());
    let set = StoppedServiceSet::new("anchor".into(), vec!["a".into(), "b".into(), "c".into()]);

    let report = sequencer(&directory, &log, 30).start_all(&set);

    assert_eq!(directory.start_requests(), vec!["anchor", "a", "b", "c"]);
    assert_eq!(report.started, vec![ServiceName::from("anchor"), ServiceName::from("a")]);
    assert_eq!(report.already_running, vec![ServiceName::from("c")]);
    assert_eq!(report.failed, vec![ServiceName::from("b")]);
    assert_eq!(log.errors().len(), 1);
}
