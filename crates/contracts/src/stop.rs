//! StopSignal - shared cooperative cancellation flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Monotone stop flag shared by the coordinator, every sampler and the
/// aggregator.
///
/// Once triggered it never resets. Threads sleeping through
/// [`wait_timeout`](Self::wait_timeout) are woken immediately on trigger, so
/// a long cadence wait does not delay shutdown.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    stopped: AtomicBool,
    lock: Mutex<()>,
    wakeup: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns `true` only for the call that flipped it.
    pub fn trigger(&self) -> bool {
        let _guard = self.inner.lock.lock();
        let first = !self.inner.stopped.swap(true, Ordering::SeqCst);
        self.inner.wakeup.notify_all();
        first
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for up to `timeout`. Returns `true` if the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut guard = self.inner.lock.lock();
        if self.is_triggered() {
            return true;
        }
        // Spurious wakeups are fine: callers re-check their own deadline.
        self.inner.wakeup.wait_for(&mut guard, timeout);
        self.is_triggered()
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("triggered", &self.is_triggered())
            .finish()
    }
}
