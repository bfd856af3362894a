//! Cancellation tokens.
//!
//! A [`CancelToken`] is a latched, shareable stop request. Work that wants to
//! be promptly cancellable either checks [`CancelToken::is_cancelled`] between
//! chunks or sleeps through [`CancelToken::sleep`], which wakes the moment the
//! token is cancelled. Blocking waits on other primitives hook in through
//! [`CancelToken::on_cancel`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Returned by interruptible waits when the token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interrupted by cancellation")]
pub struct Interrupted;

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct CancelState {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

struct CancelInner {
    cancelled: AtomicBool,
    state: Mutex<CancelState>,
    condvar: Condvar,
}

/// Shared, latching stop request.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    /// New, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                state: Mutex::new(CancelState::default()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Request cancellation. Idempotent.
    ///
    /// Wakes every sleeper and runs every registered callback exactly once.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let callbacks = {
            let mut state = self.inner.state.lock();
            std::mem::take(&mut state.callbacks)
        };
        self.inner.condvar.notify_all();
        for (_, callback) in callbacks {
            callback();
        }
    }

    /// Non-blocking check.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] as soon as the token is cancelled, including
    /// when it already was on entry.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let mut state = self.inner.state.lock();
        let Some(deadline) = Instant::now().checked_add(duration) else {
            // Unrepresentable deadline: only cancellation ends the sleep.
            while !self.is_cancelled() {
                self.inner.condvar.wait(&mut state);
            }
            return Err(Interrupted);
        };
        loop {
            if self.is_cancelled() {
                return Err(Interrupted);
            }
            if self.inner.condvar.wait_until(&mut state, deadline).timed_out() {
                return if self.is_cancelled() {
                    Err(Interrupted)
                } else {
                    Ok(())
                };
            }
        }
    }

    /// Run `callback` when the token is cancelled.
    ///
    /// If the token is already cancelled the callback runs immediately on the
    /// calling thread. Dropping the returned registration before cancellation
    /// discards the callback.
    pub fn on_cancel<F>(&self, callback: F) -> CancelRegistration
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.state.lock();
        if self.is_cancelled() {
            drop(state);
            callback();
            return CancelRegistration {
                token: Weak::new(),
                id: None,
            };
        }
        let id = state.next_id;
        state.next_id += 1;
        state.callbacks.push((id, Box::new(callback)));
        CancelRegistration {
            token: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Deregisters an [`CancelToken::on_cancel`] callback when dropped.
#[must_use = "dropping the registration discards the callback"]
pub struct CancelRegistration {
    token: Weak<CancelInner>,
    id: Option<u64>,
}

impl Drop for CancelRegistration {
    fn drop(&mut self) {
        let (Some(id), Some(inner)) = (self.id, self.token.upgrade()) else {
            return;
        };
        inner.state.lock().callbacks.retain(|(cb_id, _)| *cb_id != id);
    }
}
