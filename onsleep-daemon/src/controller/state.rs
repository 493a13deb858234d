//! Power observation and transition phase held by the controller.

use std::fmt;

/// Raw notification delivered by the host power source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSignal {
    AcPowerChanged { on_battery: bool },
    LidStateChanged { open: bool },
}

/// Latest known power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerObservation {
    pub on_battery: bool,
    pub lid_open: bool,
}

impl Default for PowerObservation {
    /// Nothing observed yet: neither guard can fire.
    fn default() -> Self {
        Self {
            on_battery: false,
            lid_open: true,
        }
    }
}

impl PowerObservation {
    pub fn apply(&mut self, signal: PowerSignal) {
        match signal {
            PowerSignal::AcPowerChanged { on_battery } => self.on_battery = on_battery,
            PowerSignal::LidStateChanged { open } => self.lid_open = open,
        }
    }

    /// On battery with the lid closed
    pub fn wants_sleep(&self) -> bool {
        self.on_battery && !self.lid_open
    }

    /// Lid open, whatever the power source
    pub fn wants_resume(&self) -> bool {
        self.lid_open
    }
}

impl fmt::Display for PowerObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lid {} Battery {}",
            if self.lid_open { "open" } else { "closed" },
            if self.on_battery { "yes" } else { "no" }
        )
    }
}

/// Where the controller is in the sleep/resume cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    #[default]
    Awake,
    EnteringSleep,
    Asleep,
    Resuming,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::Awake => "awake",
            TransitionPhase::EnteringSleep => "entering_sleep",
            TransitionPhase::Asleep => "asleep",
            TransitionPhase::Resuming => "resuming",
        }
    }

    /// `Awake→EnteringSleep→Asleep`, `Asleep→Resuming→Awake`, plus
    /// `EnteringSleep→Awake` for an aborted stop sequence.
    pub fn can_transition_to(self, next: TransitionPhase) -> bool {
        use TransitionPhase::*;
        matches!(
            (self, next),
            (Awake, EnteringSleep)
                | (EnteringSleep, Asleep)
                | (EnteringSleep, Awake)
                | (Asleep, Resuming)
                | (Resuming, Awake)
        )
    }

    /// No half-cycle is in flight
    pub fn is_terminal(self) -> bool {
        matches!(self, TransitionPhase::Awake | TransitionPhase::Asleep)
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
