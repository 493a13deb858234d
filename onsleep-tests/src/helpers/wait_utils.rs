//! Async utilities to wait for controller state

use onsleep_daemon::controller::{Controller, TransitionPhase};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Poll until the controller settles in `phase`. Returns false on timeout.
pub async fn wait_for_phase(controller: &Controller, phase: TransitionPhase, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if controller.phase() == phase {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    controller.phase() == phase
}
