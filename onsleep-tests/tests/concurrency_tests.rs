//! Notifications racing an in-flight transition

use onsleep_daemon::controller::{PowerSignal, TransitionPhase};
use onsleep_daemon::sequencer::StopPolicy;
use onsleep_daemon::service::ServiceRunState;
use onsleep_daemon::shutdown::ShutdownSignal;
use onsleep_tests::{DirectoryCall, Gate, ScriptedDirectory, TestControllerBuilder};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_signal_during_sleep_waits_then_resumes() {
    let gate = Gate::new();
    let test = TestControllerBuilder::new(
        "anchor",
        ScriptedDirectory::new()
            .with_dependents("anchor", &["a"])
            .with_enumerate_gate(gate.clone()),
    )
    .build();

    test.signal(PowerSignal::LidStateChanged { open: false });

    let sleeper = {
        let controller = test.controller.clone();
        thread::spawn(move || controller.on_power_signal(PowerSignal::AcPowerChanged { on_battery: true }))
    };
    assert!(gate.wait_entered(Duration::from_secs(5)));

    let waker = {
        let controller = test.controller.clone();
        thread::spawn(move || controller.on_power_signal(PowerSignal::LidStateChanged { open: true }))
    };
    // The lid-open notification is parked on the controller lock
    thread::sleep(Duration::from_millis(50));
    assert!(!waker.is_finished());

    gate.open();
    let sleep = sleeper.join().unwrap().expect("sleep transition");
    let resume = waker.join().unwrap().expect("resume transition");

    assert_eq!(sleep.phase, TransitionPhase::Asleep);
    assert_eq!(resume.phase, TransitionPhase::Awake);
    assert_eq!(test.controller.phase(), TransitionPhase::Awake);

    let calls = test.directory.calls();
    let last_stop = calls
        .iter()
        .rposition(|c| matches!(c, DirectoryCall::Stop(_)))
        .unwrap();
    let first_start = calls
        .iter()
        .position(|c| matches!(c, DirectoryCall::Start(_)))
        .unwrap();
    assert!(last_stop < first_start);
    assert_eq!(test.directory.enumerations(), 1);
}

#[test]
fn test_shutdown_interrupts_stop_rounds() {
    let shutdown = ShutdownSignal::new();
    let test = TestControllerBuilder::new(
        "anchor",
        ScriptedDirectory::new()
            .with_dependents("anchor", &["stuck"])
            .with_state("stuck", ServiceRunState::Running),
    )
    .with_policy(StopPolicy {
        max_rounds: 30,
        round_interval: Duration::from_secs(10),
    })
    .with_shutdown(shutdown.clone())
    .build();

    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        shutdown.trigger();
    });

    let started = Instant::now();
    let report = test.sleep().unwrap();
    trigger.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    let stop = report.stop.unwrap();
    assert!(stop.interrupted);
    assert!(stop.forced.is_empty());
    assert!(test.directory.terminations().is_empty());
    assert_eq!(test.controller.phase(), TransitionPhase::Asleep);
}
