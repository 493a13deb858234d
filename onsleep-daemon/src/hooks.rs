//! Optional external actions fired around sleep and wake.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::errors::TriggerError;

/// Which hook a trigger belongs to. The names double as configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    OnSleep,
    OnWake,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::OnSleep => "OnSleep",
            HookKind::OnWake => "OnWake",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trigger ids loaded once at service start. Immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookConfig {
    on_sleep: Option<String>,
    on_wake: Option<String>,
}

impl HookConfig {
    /// Empty ids are treated as unset.
    pub fn new(on_sleep: Option<String>, on_wake: Option<String>) -> Self {
        Self {
            on_sleep: on_sleep.filter(|s| !s.trim().is_empty()),
            on_wake: on_wake.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn trigger(&self, kind: HookKind) -> Option<&str> {
        match kind {
            HookKind::OnSleep => self.on_sleep.as_deref(),
            HookKind::OnWake => self.on_wake.as_deref(),
        }
    }
}

/// Capability to invoke a named external action.
pub trait TriggerRunner: Send + Sync {
    fn run(&self, trigger_id: &str) -> Result<(), TriggerError>;
}

impl<T: TriggerRunner + ?Sized> TriggerRunner for Arc<T> {
    fn run(&self, trigger_id: &str) -> Result<(), TriggerError> {
        (**self).run(trigger_id)
    }
}

/// What happened when a hook slot was evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// No trigger configured for this slot
    Skipped,
    Ran { trigger: String },
    Failed { trigger: String, reason: String },
}

/// Fire the trigger configured for `kind`, if any.
///
/// An unset slot is not an error and is only traced at debug level.
pub fn fire_hook(
    runner: &dyn TriggerRunner,
    hooks: &HookConfig,
    kind: HookKind,
) -> Result<HookOutcome, TriggerError> {
    let Some(trigger) = hooks.trigger(kind) else {
        debug!("No {} trigger configured, skipping", kind);
        return Ok(HookOutcome::Skipped);
    };

    debug!("Running {} trigger {}", kind, trigger);
    runner.run(trigger)?;
    Ok(HookOutcome::Ran {
        trigger: trigger.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        runs: Mutex<Vec<String>>,
        fail: bool,
    }

    impl TriggerRunner for Recorder {
        fn run(&self, trigger_id: &str) -> Result<(), TriggerError> {
            self.runs.lock().push(trigger_id.to_string());
            if self.fail {
                return Err(TriggerError::Failed {
                    trigger: trigger_id.to_string(),
                    reason: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_empty_ids_are_unset() {
        let hooks = HookConfig::new(Some(String::new()), Some("  ".to_string()));
        assert_eq!(hooks.trigger(HookKind::OnSleep), None);
        assert_eq!(hooks.trigger(HookKind::OnWake), None);
    }

    #[test]
    fn test_unset_hook_is_skipped() {
        let runner = Recorder::default();
        let outcome = fire_hook(&runner, &HookConfig::default(), HookKind::OnSleep).unwrap();
        assert_eq!(outcome, HookOutcome::Skipped);
        assert!(runner.runs.lock().is_empty());
    }

    #[test]
    fn test_configured_hook_runs() {
        let runner = Recorder::default();
        let hooks = HookConfig::new(Some("sleep-task".into()), Some("wake-task".into()));
        let outcome = fire_hook(&runner, &hooks, HookKind::OnWake).unwrap();
        assert_eq!(
            outcome,
            HookOutcome::Ran {
                trigger: "wake-task".into()
            }
        );
        assert_eq!(*runner.runs.lock(), vec!["wake-task".to_string()]);
    }

    #[test]
    fn test_runner_failure_propagates() {
        let runner = Recorder {
            fail: true,
            ..Default::default()
        };
        let hooks = HookConfig::new(Some("sleep-task".into()), None);
        let err = fire_hook(&runner, &hooks, HookKind::OnSleep).unwrap_err();
        assert!(err.to_string().contains("sleep-task"));
    }

    #[test]
    fn test_hook_kind_names() {
        assert_eq!(HookKind::OnSleep.to_string(), "OnSleep");
        assert_eq!(HookKind::OnWake.as_str(), "OnWake");
    }
}
