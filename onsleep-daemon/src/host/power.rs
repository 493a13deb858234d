//! Power notifications derived from polling the kernel's AC and lid state.
//!
//! Each tick reads a [`PowerSnapshot`]. The first snapshot emits every known
//! value; later ones emit only what changed, AC before lid. Signals are handed
//! to the controller one at a time on the blocking pool, in order.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use onsleep_unix::power_supply::{read_lid_open, read_mains_online, LID_ROOT, POWER_SUPPLY_ROOT};

use crate::controller::{Controller, PowerSignal};

/// Where to read AC and lid state from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerPaths {
    pub power_supply_root: PathBuf,
    pub lid_root: PathBuf,
}

impl Default for PowerPaths {
    fn default() -> Self {
        Self {
            power_supply_root: PathBuf::from(POWER_SUPPLY_ROOT),
            lid_root: PathBuf::from(LID_ROOT),
        }
    }
}

/// One reading of the power state. `None` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerSnapshot {
    pub mains_online: Option<bool>,
    pub lid_open: Option<bool>,
}

impl PowerSnapshot {
    /// Read failures are logged and leave the value unknown.
    pub fn read(paths: &PowerPaths) -> Self {
        let mains_online = read_mains_online(&paths.power_supply_root).unwrap_or_else(|e| {
            warn!("Failed to read AC state: {}", e);
            None
        });
        let lid_open = read_lid_open(&paths.lid_root).unwrap_or_else(|e| {
            warn!("Failed to read lid state: {}", e);
            None
        });
        Self {
            mains_online,
            lid_open,
        }
    }
}

/// Signals needed to move an observer from `prev` to `next`.
pub fn diff_signals(prev: Option<&PowerSnapshot>, next: &PowerSnapshot) -> Vec<PowerSignal> {
    let mut signals = Vec::with_capacity(2);

    if let Some(online) = next.mains_online
        && prev.and_then(|p| p.mains_online) != Some(online)
    {
        signals.push(PowerSignal::AcPowerChanged { on_battery: !online });
    }
    if let Some(open) = next.lid_open
        && prev.and_then(|p| p.lid_open) != Some(open)
    {
        signals.push(PowerSignal::LidStateChanged { open });
    }

    signals
}

pub struct PowerSource {
    paths: PowerPaths,
    interval: Duration,
}

impl PowerSource {
    pub fn new(paths: PowerPaths, interval: Duration) -> Self {
        Self { paths, interval }
    }

    /// Start polling on the current runtime. Polling stops when the returned
    /// handle is shut down or dropped.
    pub fn spawn(self, controller: Arc<Controller>) -> PowerSourceHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(controller, stop_rx));
        PowerSourceHandle {
            task: Some(task),
            stop: Some(stop_tx),
        }
    }

    async fn run(self, controller: Arc<Controller>, mut stop_rx: oneshot::Receiver<()>) {
        info!(
            "Watching power state (AC: {}, lid: {}, every {:?})",
            self.paths.power_supply_root.display(),
            self.paths.lid_root.display(),
            self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<PowerSnapshot> = None;

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    debug!("Power source stop requested");
                    break;
                }
                _ = ticker.tick() => {
                    let paths = self.paths.clone();
                    let snapshot = match tokio::task::spawn_blocking(move || PowerSnapshot::read(&paths)).await {
                        Ok(snapshot) => snapshot,
                        Err(e) => {
                            error!("Power state read task failed: {}", e);
                            continue;
                        }
                    };

                    if last.is_none() && snapshot.lid_open.is_none() {
                        warn!("No lid switch found, sleep transitions will never trigger");
                    }

                    for signal in diff_signals(last.as_ref(), &snapshot) {
                        debug!("Power signal {:?}", signal);
                        let controller = controller.clone();
                        if let Err(e) =
                            tokio::task::spawn_blocking(move || controller.on_power_signal(signal)).await
                        {
                            error!("Power signal delivery failed: {}", e);
                        }
                    }
                    last = Some(snapshot);
                }
            }
        }
    }
}

/// Registration guard for a running [`PowerSource`].
pub struct PowerSourceHandle {
    task: Option<JoinHandle<()>>,
    stop: Option<oneshot::Sender<()>>,
}

impl PowerSourceHandle {
    /// Stop polling and wait for an in-flight delivery to finish.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            error!("Power source task failed: {}", e);
        }
    }
}

impl Drop for PowerSourceHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
