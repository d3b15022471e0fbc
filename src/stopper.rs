//! Cooperative cancellation (§5).
//!
//! A [`Stopper`] is a cheaply-cloned, thread-safe flag. It is checked at the top of every ArciDispatch
//! loop iteration and before every [`SubDispatchPipe`](crate::wrappers::SubDispatchPipe) step. Setting
//! it from another thread causes the current dispatch to abandon the frontier at its next check and
//! raise [`DispatchError::Abort`](crate::error::DispatchError::Abort); it does not interrupt a user
//! function already executing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared cancellation signal. Clones observe the same underlying flag.
#[derive(Clone, Debug, Default)]
pub struct Stopper(Arc<AtomicBool>);

impl Stopper {
    /// A fresh, unset stopper.
    pub fn new() -> Self {
        Stopper(Arc::new(AtomicBool::new(false)))
    }

    /// Whether the stopper has been set.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sets the stopper, requesting cancellation of every dispatch sharing this handle.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clears the stopper, allowing future dispatches on this handle to proceed.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
