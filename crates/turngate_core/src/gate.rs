//! # Phase Gate
//!
//! The single synchronization object arbitrating access alternation.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────────────────────┐
//!                  │          PhaseGate           │
//!                  │                              │
//!                  │  ┌────────────────────────┐  │
//!                  │  │ Mutex<GateState>       │  │
//!                  │  │  phase: Read | Write   │  │
//!                  │  │  active_readers: u32   │  │
//!                  │  │  writer_holds_token    │  │
//!                  │  └────────────────────────┘  │
//!                  │         Condvar (turn)       │
//!                  └──────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!      ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//!      │ Reader Gate  │ │ Writer Lock  │ │ Phase Ctrl   │
//!      │ enter/exit   │ │ enter/exit   │ │ transition   │
//!      └──────────────┘ └──────────────┘ └──────────────┘
//! ```
//!
//! ## Turn-taking policy
//!
//! The gate alternates strictly: one full read generation (zero or more
//! readers), then one writer, repeating. Two consequences are part of the
//! contract, not defects:
//!
//! - A live stream of readers re-entering before the count drains to zero
//!   keeps the phase at `Read` and starves waiting writers indefinitely.
//! - Once the phase is `Write`, no new reader is admitted, so a waiting
//!   writer cannot be starved after the flip.
//!
//! Writer wake order is whatever the condvar provides; FIFO ticketing would
//! strengthen fairness but is not part of this design.
//!
//! A registered reader always finishes its section; nothing preempts a
//! read once admission has completed. And the gate cannot protect itself
//! from a caller that never exits: a writer sitting on the token forever
//! starves every later section permanently. Exiting is a caller
//! obligation, not something the gate detects.

use parking_lot::{Condvar, Mutex};

use crate::phase::{GateSnapshot, Phase};

/// All shared state, protected by one lock.
///
/// Keeping the three fields under a single mutex makes every compound step
/// (decrement-then-check, flip-and-wake) atomic without further ceremony.
#[derive(Debug)]
struct GateState {
    /// Whose turn it is.
    phase: Phase,
    /// Readers currently inside their read section. Never negative: the
    /// type plus the fail-fast check in [`PhaseGate::exit_read`] enforce it.
    active_readers: u32,
    /// The writer exclusion token. `true` while exactly one writer is
    /// inside its write section.
    writer_holds_token: bool,
}

/// Phase-alternating reader/writer gate.
///
/// Owns the phase flag, the active-reader count and the writer exclusion
/// token. Workers call the entry/exit pairs; the gate decides when the turn
/// flips. Waits block on a condition variable and re-check their predicate
/// in a loop, so spurious wakeups retry locally and are never surfaced.
///
/// Entry and exit must be called in matched pairs per section. An exit
/// without a matching enter is a caller bug and panics immediately.
#[derive(Debug)]
pub struct PhaseGate {
    state: Mutex<GateState>,
    turn: Condvar,
}

impl PhaseGate {
    /// Creates a gate in its initial state: phase `Read`, no active
    /// readers, token free.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                phase: Phase::Read,
                active_readers: 0,
                writer_holds_token: false,
            }),
            turn: Condvar::new(),
        }
    }

    // =========================================================================
    // Phase Controller
    // =========================================================================

    /// Returns the current phase.
    #[inline]
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Returns how many readers are inside their read section right now.
    #[inline]
    #[must_use]
    pub fn active_readers(&self) -> u32 {
        self.state.lock().active_readers
    }

    /// Returns whether a writer currently holds the exclusion token.
    #[inline]
    #[must_use]
    pub fn writer_holds_token(&self) -> bool {
        self.state.lock().writer_holds_token
    }

    /// Takes a consistent snapshot of phase, reader count and token state.
    #[must_use]
    pub fn snapshot(&self) -> GateSnapshot {
        let state = self.state.lock();
        GateSnapshot {
            phase: state.phase,
            active_readers: state.active_readers,
            writer_holds_token: state.writer_holds_token,
        }
    }

    /// Flips the phase and wakes every waiter.
    ///
    /// This is the single authority for changing the phase. The two exit
    /// paths call it for their transition events (last reader out, writer
    /// finished); a harness may call it to stage a phase directly. Flipping
    /// to the already-current phase is a no-op apart from the wakeup.
    pub fn request_transition(&self, to: Phase) {
        let mut state = self.state.lock();
        self.transition_locked(&mut state, to);
    }

    /// Phase flip with the lock already held. Waiters re-check their
    /// predicate on wake, so waking everyone is correct for both roles.
    fn transition_locked(&self, state: &mut GateState, to: Phase) {
        if state.phase != to {
            tracing::trace!(from = %state.phase, to = %to, "phase transition");
            state.phase = to;
        }
        self.turn.notify_all();
    }

    // =========================================================================
    // Reader Admission Gate
    // =========================================================================

    /// Blocks until the phase is `Read`, then registers as an active reader.
    ///
    /// Any number of readers may be registered at once. The caller must pair
    /// this with exactly one [`exit_read`](Self::exit_read).
    pub fn enter_read(&self) {
        let mut state = self.state.lock();
        while state.phase != Phase::Read {
            self.turn.wait(&mut state);
        }
        state.active_readers += 1;
        tracing::trace!(active_readers = state.active_readers, "reader entered");
    }

    /// Deregisters an active reader; the last one out flips the turn.
    ///
    /// The decrement and the zero check happen under the same lock
    /// acquisition, so exactly one reader - the one whose decrement produces
    /// zero - triggers the flip to `Write`.
    ///
    /// # Panics
    ///
    /// Panics if no reader is registered (exit without a matching enter).
    pub fn exit_read(&self) {
        let mut state = self.state.lock();
        assert!(
            state.active_readers > 0,
            "exit_read without a matching enter_read! active-reader count would go negative"
        );
        state.active_readers -= 1;
        tracing::trace!(active_readers = state.active_readers, "reader exited");
        if state.active_readers == 0 {
            self.transition_locked(&mut state, Phase::Write);
        }
    }

    // =========================================================================
    // Writer Exclusion Lock
    // =========================================================================

    /// Blocks until the phase is `Write`, every reader has drained and the
    /// token is free, then takes the token.
    ///
    /// At most one writer is past this call at any time. A second writer
    /// waits here until a whole new `Write` phase comes around: the current
    /// writer's exit flips the turn back to the readers. The caller must
    /// pair this with exactly one [`exit_write`](Self::exit_write).
    ///
    /// On the normal path the phase only becomes `Write` once the count
    /// drains to zero, so the reader check never bites. It exists for the
    /// staged path: [`request_transition`](Self::request_transition) can
    /// flip the phase while readers are still registered, and a writer must
    /// not be admitted beside them.
    pub fn enter_write(&self) {
        let mut state = self.state.lock();
        while state.phase != Phase::Write || state.active_readers > 0 || state.writer_holds_token {
            self.turn.wait(&mut state);
        }
        state.writer_holds_token = true;
        tracing::trace!("writer entered");
    }

    /// Releases the token and hands the turn back to the readers.
    ///
    /// # Panics
    ///
    /// Panics if the token is not held (exit without a matching enter).
    pub fn exit_write(&self) {
        let mut state = self.state.lock();
        assert!(
            state.writer_holds_token,
            "exit_write without a matching enter_write! exclusion token is not held"
        );
        state.writer_holds_token = false;
        tracing::trace!("writer exited");
        self.transition_locked(&mut state, Phase::Read);
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Verifies the gate is quiescent before teardown.
    ///
    /// The parking-lot primitives own no OS handles, so the quiescence check
    /// is the whole operation.
    ///
    /// # Panics
    ///
    /// Panics if a reader is still active or a writer still holds the token.
    pub fn shutdown(&self) {
        let state = self.state.lock();
        assert!(
            state.active_readers == 0 && !state.writer_holds_token,
            "shutdown while the gate is busy! active_readers={}, writer_holds_token={}",
            state.active_readers,
            state.writer_holds_token
        );
    }
}

impl Default for PhaseGate {
    fn default() -> Self {
        Self::new()
    }
}
