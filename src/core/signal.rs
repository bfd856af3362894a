//! Single-fire completion signal.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::cancel::{CancelToken, Interrupted};
use super::status::TaskStatus;

struct SignalInner {
    /// `Some` once fired; never reset.
    outcome: Mutex<Option<TaskStatus>>,
    condvar: Condvar,
}

/// Fires exactly once with a terminal status and stays fired.
///
/// Any number of threads may wait on a signal; all of them observe the same
/// status. Waiting uses the paired `Condvar`, no polling.
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<SignalInner>,
}

impl CompletionSignal {
    /// New, unfired signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                outcome: Mutex::new(None),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Fire with a terminal status.
    ///
    /// Returns `true` only for the call that actually fired the signal.
    /// Later calls, and calls with a non-terminal status, change nothing.
    pub fn fire(&self, status: TaskStatus) -> bool {
        if !status.is_terminal() {
            return false;
        }
        {
            let mut outcome = self.inner.outcome.lock();
            if outcome.is_some() {
                return false;
            }
            *outcome = Some(status);
        }
        self.inner.condvar.notify_all();
        true
    }

    /// The fired status, if any, without blocking.
    #[must_use]
    pub fn poll(&self) -> Option<TaskStatus> {
        *self.inner.outcome.lock()
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.poll().is_some()
    }

    /// Block until fired.
    pub fn wait(&self) -> TaskStatus {
        let mut outcome = self.inner.outcome.lock();
        loop {
            if let Some(status) = *outcome {
                return status;
            }
            self.inner.condvar.wait(&mut outcome);
        }
    }

    /// Block until fired or until `timeout` elapses.
    ///
    /// A timeout too large to express as a deadline waits without bound.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<TaskStatus> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.wait());
        };
        let mut outcome = self.inner.outcome.lock();
        loop {
            if let Some(status) = *outcome {
                return Some(status);
            }
            if self.inner.condvar.wait_until(&mut outcome, deadline).timed_out() {
                return *outcome;
            }
        }
    }

    /// Block until fired, or until the waiter's own `token` is cancelled.
    ///
    /// A signal that is already fired wins over a cancelled token.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] when `token` is cancelled before the signal fires.
    pub fn wait_cancellable(&self, token: &CancelToken) -> Result<TaskStatus, Interrupted> {
        let inner = Arc::clone(&self.inner);
        let _registration = token.on_cancel(move || {
            let _outcome = inner.outcome.lock();
            inner.condvar.notify_all();
        });

        let mut outcome = self.inner.outcome.lock();
        loop {
            if let Some(status) = *outcome {
                return Ok(status);
            }
            if token.is_cancelled() {
                return Err(Interrupted);
            }
            self.inner.condvar.wait(&mut outcome);
        }
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("outcome", &self.poll())
            .finish()
    }
}
