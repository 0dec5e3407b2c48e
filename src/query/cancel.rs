//! Cancellation slots.
//!
//! Each cancellable operation family (blocking execution, cursor open) owns one
//! slot holding at most one token. Binding a new token overwrites the slot; the
//! guard returned by [`CancelSlot::bind`] clears it again only while it still
//! owns it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Bound {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Slot holding the cancellation token of the in-flight operation.
#[derive(Debug, Default)]
pub struct CancelSlot {
    bound: Mutex<Bound>,
    generations: AtomicU64,
}

impl CancelSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Bound> {
        // The guarded state stays consistent even if a holder panicked.
        self.bound.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bind a fresh token, retiring whatever token was bound before.
    pub fn bind(&self) -> CancelGuard<'_> {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let mut bound = self.lock();
        bound.generation = generation;
        bound.token = Some(token.clone());

        CancelGuard {
            slot: self,
            generation,
            token,
        }
    }

    /// Cancel the bound token. Returns `false` if nothing was bound.
    pub fn cancel(&self) -> bool {
        match self.lock().token.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Check whether a token is bound.
    pub fn is_bound(&self) -> bool {
        self.lock().token.is_some()
    }

    fn release(&self, generation: u64) {
        let mut bound = self.lock();
        if bound.generation == generation {
            bound.token = None;
        }
    }
}

/// Ownership of one bound token; clears the slot on drop if still current.
#[derive(Debug)]
pub struct CancelGuard<'a> {
    slot: &'a CancelSlot,
    generation: u64,
    token: CancellationToken,
}

impl CancelGuard<'_> {
    /// The bound token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        self.slot.release(self.generation);
    }
}

/// Cloneable handle for cancelling through a slot from outside its owner.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    slot: Arc<CancelSlot>,
}

impl CancelHandle {
    pub(crate) fn new(slot: Arc<CancelSlot>) -> Self {
        Self { slot }
    }

    /// Cancel the operation currently bound to the slot, if any.
    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_empty_slot_is_noop() {
        let slot = CancelSlot::new();
        assert!(!slot.cancel());
        assert!(!slot.is_bound());
    }

    #[test]
    fn test_bind_and_cancel() {
        let slot = CancelSlot::new();
        let guard = slot.bind();

        assert!(slot.is_bound());
        assert!(slot.cancel());
        assert!(guard.token().is_cancelled());

        drop(guard);
        assert!(!slot.is_bound());
    }

    #[test]
    fn test_rebind_retires_previous_token() {
        let slot = CancelSlot::new();
        let first = slot.bind();
        let second = slot.bind();

        slot.cancel();
        assert!(second.token().is_cancelled());
        assert!(!first.token().is_cancelled());

        // The stale guard must not clear the newer binding.
        drop(first);
        assert!(slot.is_bound());

        drop(second);
        assert!(!slot.is_bound());
    }

    #[test]
    fn test_handle_cancels_through_slot() {
        let slot = Arc::new(CancelSlot::new());
        let handle = CancelHandle::new(Arc::clone(&slot));

        assert!(!handle.cancel());
        let guard = slot.bind();
        assert!(handle.cancel());
        assert!(guard.token().is_cancelled());
    }
}
