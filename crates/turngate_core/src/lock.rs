//! # Turn Lock
//!
//! Typed wrapper binding one protected value to a [`PhaseGate`].
//!
//! ## Safety Note
//!
//! This module requires unsafe code to hand out references into the
//! `UnsafeCell`. All unsafe blocks are justified by the gate's invariants.

#![allow(unsafe_code)]
//!
//! ## Access discipline
//!
//! - [`TurnLock::read`] admits any number of readers together while the
//!   turn is with the readers
//! - [`TurnLock::write`] admits exactly one writer while the turn is with
//!   the writers
//! - Section exit happens in the guard's `Drop`, so the matched
//!   enter/exit pairing cannot be violated by construction
//!
//! The gate inside is private: no caller can deregister a reader while a
//! guard still dereferences the value, which is what makes the handed-out
//! references sound.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};

use crate::gate::PhaseGate;
use crate::phase::{GateSnapshot, Phase};

/// A value guarded by phase-alternating reader/writer arbitration.
///
/// The access discipline is the [`PhaseGate`]'s: read generations and
/// single writers strictly take turns. Unlike a plain `RwLock`, a drained
/// read generation hands the turn to the writers even if no writer is
/// waiting yet.
#[derive(Debug)]
pub struct TurnLock<T> {
    /// Arbitration state. Private: see the module docs on soundness.
    gate: PhaseGate,
    /// The protected value. Only guards may touch it.
    data: UnsafeCell<T>,
}

// SAFETY: TurnLock hands `&mut T` across threads through write guards.
unsafe impl<T: Send> Send for TurnLock<T> {}
// SAFETY: shared access is only ever `&T` under an active read
// registration, and exclusive access only under the writer token; the gate
// guarantees the two never overlap.
unsafe impl<T: Send + Sync> Sync for TurnLock<T> {}

impl<T> TurnLock<T> {
    /// Wraps a value. The gate starts in `Read` phase with no one active.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            gate: PhaseGate::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Blocks until the readers' turn, then returns a shared guard.
    ///
    /// Any number of read guards may be alive at once.
    #[must_use]
    pub fn read(&self) -> TurnReadGuard<'_, T> {
        self.gate.enter_read();
        TurnReadGuard { lock: self }
    }

    /// Blocks until the writers' turn and the token is free, then returns
    /// the exclusive guard.
    #[must_use]
    pub fn write(&self) -> TurnWriteGuard<'_, T> {
        self.gate.enter_write();
        TurnWriteGuard { lock: self }
    }

    /// Returns the current phase.
    #[inline]
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.gate.current_phase()
    }

    /// Returns how many read guards are alive right now.
    #[inline]
    #[must_use]
    pub fn active_readers(&self) -> u32 {
        self.gate.active_readers()
    }

    /// Takes a consistent snapshot of the arbitration state.
    #[must_use]
    pub fn snapshot(&self) -> GateSnapshot {
        self.gate.snapshot()
    }

    /// Hands the turn to the given phase, waking waiters.
    ///
    /// Staging only: the value itself stays untouchable without a guard,
    /// and write admission still waits for every live read guard to drain.
    pub fn request_transition(&self, to: Phase) {
        self.gate.request_transition(to);
    }

    /// Verifies quiescence before teardown.
    ///
    /// # Panics
    ///
    /// Panics if any guard is still alive.
    pub fn shutdown(&self) {
        self.gate.shutdown();
    }

    /// Consumes the lock and returns the value.
    ///
    /// Taking `self` by value proves no guard is alive.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// Shared access to the value for one read section.
///
/// Dropping the guard deregisters the reader; the last guard of a
/// generation hands the turn to the writers.
pub struct TurnReadGuard<'a, T> {
    lock: &'a TurnLock<T>,
}

impl<T> Deref for TurnReadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: this reader is registered, so the gate admits no writer
        // while the guard is alive; concurrent readers only take `&T`.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for TurnReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.gate.exit_read();
    }
}

/// Exclusive access to the value for one write section.
///
/// Dropping the guard releases the token and hands the turn back to the
/// readers.
pub struct TurnWriteGuard<'a, T> {
    lock: &'a TurnLock<T>,
}

impl<T> Deref for TurnWriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: the writer token is held, so no other guard is alive.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for TurnWriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the writer token is held, so no other guard is alive.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for TurnWriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.gate.exit_write();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_lock_creation() {
        let lock = TurnLock::new(42u64);
        assert_eq!(lock.current_phase(), Phase::Read);
        assert_eq!(lock.active_readers(), 0);
        assert!(lock.snapshot().is_quiescent());
    }

    #[test]
    fn test_concurrent_read_guards() {
        let lock = TurnLock::new(7u64);

        let a = lock.read();
        let b = lock.read();
        assert_eq!(*a + *b, 14);
        assert_eq!(lock.active_readers(), 2);

        drop(a);
        // One reader still in: turn stays with the readers.
        assert_eq!(lock.current_phase(), Phase::Read);
        drop(b);
        assert_eq!(lock.current_phase(), Phase::Write);
    }

    #[test]
    fn test_write_after_generation_drains() {
        let lock = TurnLock::new(String::from("v0"));

        drop(lock.read()); // drained generation hands the turn over
        {
            let mut guard = lock.write();
            guard.push_str("->v1");
        }
        assert_eq!(lock.current_phase(), Phase::Read);
        assert_eq!(*lock.read(), "v0->v1");
    }

    #[test]
    fn test_mutation_visible_across_threads() {
        let lock = Arc::new(TurnLock::new(0u64));

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                *lock.write() = 99;
            })
        };

        // Drain one empty-ish generation so the writer gets its turn.
        drop(lock.read());
        writer.join().expect("writer thread panicked");

        assert_eq!(*lock.read(), 99);
    }

    #[test]
    fn test_staged_transition_cannot_alias_a_read_guard() {
        // A held read guard plus a staged `Write` phase must never yield a
        // write guard beside the live reader.
        use std::sync::atomic::{AtomicBool, Ordering};

        let lock = Arc::new(TurnLock::new(0u64));
        let guard = lock.read();
        lock.request_transition(Phase::Write);

        let wrote = Arc::new(AtomicBool::new(false));
        let writer = {
            let lock = Arc::clone(&lock);
            let wrote = Arc::clone(&wrote);
            thread::spawn(move || {
                *lock.write() = 42;
                wrote.store(true, Ordering::SeqCst);
            })
        };

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(
            !wrote.load(Ordering::SeqCst),
            "write guard handed out beside a live read guard"
        );
        assert_eq!(*guard, 0);

        drop(guard);
        writer.join().expect("writer thread panicked");
        assert!(wrote.load(Ordering::SeqCst));
        assert_eq!(*lock.read(), 42);
    }

    #[test]
    fn test_into_inner() {
        let lock = TurnLock::new(vec![1, 2, 3]);
        drop(lock.read());
        *lock.write() = vec![4, 5];
        assert_eq!(lock.into_inner(), vec![4, 5]);
    }
}
