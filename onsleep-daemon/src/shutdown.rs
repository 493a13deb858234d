//! Process-wide shutdown flag with an interruptible wait.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Inner {
    requested: Mutex<bool>,
    cvar: Condvar,
}

/// Cloneable handle; all clones observe the same flag.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("requested", &self.is_triggered())
            .finish()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter.
    pub fn trigger(&self) {
        let mut requested = self.inner.requested.lock();
        *requested = true;
        self.inner.cvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.requested.lock()
    }

    /// Block for `timeout` unless shutdown is requested first.
    ///
    /// Returns `true` if the full timeout elapsed, `false` if the wait was cut
    /// short (or shutdown had already been requested).
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut requested = self.inner.requested.lock();
        while !*requested {
            if self
                .inner
                .cvar
                .wait_until(&mut requested, deadline)
                .timed_out()
            {
                return !*requested;
            }
        }
        false
    }
}
