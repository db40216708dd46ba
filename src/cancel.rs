//! # Cancel — Shared Cooperative Cancellation Signal
//!
//! One token per search. Clones share the same flag; it can be set by the
//! winning worker, a timeout watchdog, or a signal handler, and never resets.
//! Holders poll it at their own checkpoints: the producer before each send,
//! workers before and after each verifier call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal. Returns true only for the call that actually flipped it.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
