//! # TURNGATE Core Primitive
//!
//! Phase-alternating reader/writer arbitration for one shared resource:
//! - Any number of readers proceed together while the gate is in `Read` phase
//! - Exactly one writer proceeds while the gate is in `Write` phase
//! - The last reader out hands the turn to the writers; a finishing writer
//!   hands it back to the readers
//!
//! ## Architecture Rules
//!
//! 1. **One synchronization object** - The phase flag, the active-reader
//!    count and the writer token live behind a single lock, never in globals
//! 2. **Blocking waits** - Condition variables, no busy-wait polling
//! 3. **Fail fast** - Contract violations panic with the broken invariant;
//!    nothing is silently clamped
//!
//! ## Example
//!
//! ```rust,ignore
//! use turngate_core::TurnLock;
//!
//! let lock = TurnLock::new(0u64);
//! let value = *lock.read();   // concurrent with other readers
//! *lock.write() += 1;         // exclusive
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod gate;
pub mod lock;
pub mod phase;

pub use gate::PhaseGate;
pub use lock::{TurnLock, TurnReadGuard, TurnWriteGuard};
pub use phase::{GateSnapshot, Phase};
