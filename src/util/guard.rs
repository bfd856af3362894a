//! Scope guard used to give worker settlement `finally` semantics.

/// Runs a closure when dropped: on normal return, early return, or unwind.
///
/// The closure sits in an `Option` so it is taken out exactly once.
pub(crate) struct ScopeGuard<F: FnOnce()> {
    closure: Option<F>,
}

impl<F: FnOnce()> ScopeGuard<F> {
    /// Creates an armed guard.
    pub(crate) const fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
        }
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(closure) = self.closure.take() {
            closure();
        }
    }
}
